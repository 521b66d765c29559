//! Layout generators for interdigitized transistor pairs.
//!
//! Two devices, A and B, are tiled in an alternating A-B-A-B row. Their
//! like-named terminals are merged into continuous rails. See
//! [`interdigitized::two_transistor_interdigitized`] for the core generator
//! and [`interdigitized::two_nfet_interdigitized`] for the guard-ringed variant.

pub mod devices;
pub mod error;
pub mod interdigitized;
pub mod io;
pub mod layout;
pub mod pdk;

pub use arcstr;
pub use subgeom;

pub(crate) mod log;
