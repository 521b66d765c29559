//! IO utilities.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use subgeom::bbox::Bbox;
use subgeom::Shape;

use crate::error::{with_err_context, ErrorContext, Result};
use crate::layout::cell::Cell;
use crate::layout::port::Port;
use crate::pdk::layers::{GLayer, GdsLayerSpec};
use crate::pdk::MappedPdk;

pub fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    with_err_context(std::fs::create_dir_all(path), || {
        ErrorContext::CreateDir(path.to_path_buf())
    })?;
    Ok(())
}

pub fn create_file(path: impl AsRef<Path>) -> Result<std::fs::File> {
    let path = path.as_ref();
    let file = with_err_context(std::fs::File::create(path), || {
        ErrorContext::CreateFile(path.to_path_buf())
    })?;
    Ok(file)
}

pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let data = with_err_context(std::fs::read_to_string(path), || {
        ErrorContext::ReadFile(path.to_path_buf())
    })?;
    Ok(data)
}

/// A shape in a flattened layout, tagged with its process layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatElement {
    pub layer: GLayer,
    /// `None` if the process has no GDS layer for `layer`.
    pub gds: Option<GdsLayerSpec>,
    pub shape: Shape,
}

/// A flattened layout as written by [`write_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLayout {
    pub name: String,
    pub process: String,
    pub grid: i64,
    pub bbox: Bbox,
    pub elements: Vec<FlatElement>,
    pub ports: Vec<Port>,
}

impl FlatLayout {
    pub fn new(pdk: &dyn MappedPdk, cell: &Cell) -> Self {
        Self {
            name: cell.name().to_string(),
            process: pdk.name().to_string(),
            grid: pdk.layout_grid(),
            bbox: cell.bbox(),
            elements: cell
                .flat_elems()
                .into_iter()
                .map(|elem| FlatElement {
                    layer: elem.layer,
                    gds: pdk.gds_layer(elem.layer),
                    shape: elem.inner,
                })
                .collect(),
            ports: cell.ports().cloned().collect(),
        }
    }
}

/// Flattens `cell` and writes it to `path` as JSON, creating parent
/// directories as needed.
pub fn write_json(pdk: &dyn MappedPdk, cell: &Cell, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(create_file(path)?);
    let layout = FlatLayout::new(pdk, cell);
    with_err_context(serde_json::to_writer_pretty(&mut writer, &layout), || {
        ErrorContext::CreateFile(path.to_path_buf())
    })?;
    with_err_context(writer.flush(), || ErrorContext::CreateFile(path.to_path_buf()))?;
    Ok(())
}

/// Reads a layout written by [`write_json`].
pub fn read_json(path: impl AsRef<Path>) -> Result<FlatLayout> {
    let path = path.as_ref();
    let data = read_to_string(path)?;
    let layout = with_err_context(serde_json::from_str(&data), || {
        ErrorContext::ReadFile(path.to_path_buf())
    })?;
    Ok(layout)
}
