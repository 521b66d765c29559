#![allow(dead_code)]

use std::path::PathBuf;

use interdigit::interdigitized::{DummySpec, InterdigitizedParams, WrappedParams};
use lazy_static::lazy_static;
use sky130_mapped_pdk::Sky130MappedPdk;

pub const BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

lazy_static! {
    pub static ref PDK: Sky130MappedPdk =
        Sky130MappedPdk::new().expect("failed to load bundled SKY130 rule deck");
}

pub fn out_path(test_name: &str, file_name: &str) -> PathBuf {
    PathBuf::from(BUILD_DIR).join(format!("tests/{test_name}/{file_name}"))
}

pub fn core_params(numcols: usize, dummy: impl Into<DummySpec>) -> InterdigitizedParams {
    InterdigitizedParams::builder()
        .numcols(numcols)
        .dummy(dummy)
        .build()
        .unwrap()
}

pub fn wrapped_params(numcols: usize, with_tie: bool, with_substrate_tap: bool) -> WrappedParams {
    WrappedParams::builder()
        .numcols(numcols)
        .with_tie(with_tie)
        .with_substrate_tap(with_substrate_tap)
        .build()
        .unwrap()
}
