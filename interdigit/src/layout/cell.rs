use std::sync::Arc;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use subgeom::bbox::{Bbox, BoundBox};
use subgeom::transform::TranslateOwned;
use subgeom::{Point, Rect, Shape};

use super::port::{Port, PortError, PortMap};
use super::validation::validate_cell;
use crate::error::{Error, ErrorSource};
use crate::pdk::layers::GLayer;

/// A shape drawn on a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    pub layer: GLayer,
    pub inner: Shape,
}

impl Element {
    pub fn new(layer: GLayer, inner: impl Into<Shape>) -> Self {
        Self {
            layer,
            inner: inner.into(),
        }
    }

    pub fn translated(self, p: Point) -> Self {
        Self {
            layer: self.layer,
            inner: self.inner.translate_owned(p),
        }
    }
}

impl BoundBox for Element {
    fn bbox(&self) -> Bbox {
        self.inner.bbox()
    }
}

/// A placement of a [`Cell`] at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    name: ArcStr,
    cell: Arc<Cell>,
    loc: Point,
}

impl Instance {
    pub fn new(name: impl Into<ArcStr>, cell: Arc<Cell>, loc: Point) -> Self {
        Self {
            name: name.into(),
            cell,
            loc,
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }

    /// Returns the port with the given name, in the parent cell's coordinates.
    pub fn port(&self, name: &str) -> Result<Port, PortError> {
        Ok(self.cell.port(name)?.clone().translated(self.loc))
    }

    /// Returns all ports of the instantiated cell, in the parent cell's coordinates.
    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.cell
            .ports()
            .map(move |port| port.clone().translated(self.loc))
    }

    pub fn translated(mut self, p: Point) -> Self {
        self.loc = self.loc + p;
        self
    }
}

impl BoundBox for Instance {
    fn bbox(&self) -> Bbox {
        let bbox = self.cell.bbox();
        if bbox.is_empty() {
            return bbox;
        }
        Bbox::new(bbox.p0 + self.loc, bbox.p1 + self.loc)
    }
}

/// An immutable layout cell.
///
/// Cells are built with a [`CellBuilder`]. Every transformation of a cell
/// produces a new cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    name: ArcStr,
    elems: Vec<Element>,
    insts: Vec<Instance>,
    ports: PortMap,
}

impl Cell {
    #[inline]
    pub fn builder(name: impl Into<ArcStr>) -> CellBuilder {
        CellBuilder::new(name)
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn elems(&self) -> &[Element] {
        &self.elems
    }

    #[inline]
    pub fn insts(&self) -> &[Instance] {
        &self.insts
    }

    /// Finds the instance with the given name.
    pub fn inst(&self, name: &str) -> Option<&Instance> {
        self.insts.iter().find(|inst| inst.name.as_str() == name)
    }

    #[inline]
    pub fn port_map(&self) -> &PortMap {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Result<&Port, PortError> {
        self.ports.port(name)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.ports()
    }

    /// The bounding box of all geometry in the cell and its instances.
    ///
    /// Ports do not contribute to the bounding box.
    pub fn bbox(&self) -> Bbox {
        self.elems.bbox().union(self.insts.bbox())
    }

    /// The bounding box of all geometry on `layer`, including geometry inside instances.
    pub fn layer_bbox(&self, layer: GLayer) -> Bbox {
        self.flat_elems()
            .into_iter()
            .filter(|elem| elem.layer == layer)
            .fold(Bbox::empty(), |acc, elem| acc.union(elem.bbox()))
    }

    /// Collects every element in the hierarchy, in this cell's coordinates.
    pub fn flat_elems(&self) -> Vec<Element> {
        let mut out = Vec::with_capacity(self.elems.len());
        self.collect_flat(Point::zero(), &mut out);
        out
    }

    fn collect_flat(&self, offset: Point, out: &mut Vec<Element>) {
        out.extend(self.elems.iter().map(|elem| elem.translated(offset)));
        for inst in self.insts.iter() {
            inst.cell.collect_flat(offset + inst.loc, out);
        }
    }

    /// Returns a copy of this cell with all instances dissolved into plain elements.
    pub fn flatten(&self) -> Cell {
        Cell {
            name: self.name.clone(),
            elems: self.flat_elems(),
            insts: Vec::new(),
            ports: self.ports.clone(),
        }
    }

    /// Returns a copy of this cell with all geometry and ports moved by `p`.
    pub fn translated(&self, p: Point) -> Cell {
        Cell {
            name: self.name.clone(),
            elems: self.elems.iter().map(|elem| elem.translated(p)).collect(),
            insts: self
                .insts
                .iter()
                .cloned()
                .map(|inst| inst.translated(p))
                .collect(),
            ports: self.ports.translated(p),
        }
    }

    /// Returns a copy of this cell moved so that its bounding box center is
    /// at the origin, to the nearest point on `grid`.
    pub fn centered(&self, grid: i64) -> Cell {
        let bbox = self.bbox();
        if bbox.is_empty() {
            return self.clone();
        }
        let center = bbox.center().snap_to_grid(grid);
        self.translated(-center)
    }

    /// Checks the flattened cell against `grid`, logging every problem found.
    pub fn validate(&self, grid: i64) -> crate::error::Result<()> {
        let validation = validate_cell(self, grid);
        validation.log();
        if validation.has_errors() {
            return Err(Error::new(ErrorSource::InvalidLayout(
                validation.first_error().unwrap_or_default(),
            )));
        }
        Ok(())
    }

    /// Reopens the cell for extension.
    pub fn into_builder(self) -> CellBuilder {
        CellBuilder {
            name: self.name,
            elems: self.elems,
            insts: self.insts,
            ports: self.ports,
        }
    }

    /// Returns a copy of this cell under a new name.
    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Cell {
        self.name = name.into();
        self
    }
}

impl BoundBox for Cell {
    fn bbox(&self) -> Bbox {
        Cell::bbox(self)
    }
}

/// Accumulates geometry, instances, and ports for a [`Cell`].
#[derive(Debug, Clone)]
pub struct CellBuilder {
    name: ArcStr,
    elems: Vec<Element>,
    insts: Vec<Instance>,
    ports: PortMap,
}

impl CellBuilder {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            elems: Vec::new(),
            insts: Vec::new(),
            ports: PortMap::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    pub fn draw(&mut self, layer: GLayer, shape: impl Into<Shape>) {
        self.elems.push(Element::new(layer, shape));
    }

    #[inline]
    pub fn draw_rect(&mut self, layer: GLayer, rect: Rect) {
        self.draw(layer, rect);
    }

    /// Adds an instance, returning a reference to it.
    pub fn add_inst(&mut self, inst: Instance) -> &Instance {
        self.insts.push(inst);
        &self.insts[self.insts.len() - 1]
    }

    #[inline]
    pub fn insts(&self) -> &[Instance] {
        &self.insts
    }

    pub fn add_port(&mut self, port: Port) -> Result<(), PortError> {
        self.ports.add_port(port)
    }

    pub fn add_ports(&mut self, ports: impl IntoIterator<Item = Port>) -> Result<(), PortError> {
        self.ports.add_ports(ports)
    }

    /// Adds ports, prepending `prefix` to each of their names.
    pub fn add_ports_with_prefix(
        &mut self,
        ports: impl IntoIterator<Item = Port>,
        prefix: &str,
    ) -> Result<(), PortError> {
        self.ports
            .add_ports(ports.into_iter().map(|port| port.with_prefix(prefix)))
    }

    #[inline]
    pub fn port_map(&self) -> &PortMap {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Result<&Port, PortError> {
        self.ports.port(name)
    }

    pub fn bbox(&self) -> Bbox {
        self.elems.bbox().union(self.insts.bbox())
    }

    /// The bounding box of everything drawn so far on `layer`, including inside instances.
    pub fn layer_bbox(&self, layer: GLayer) -> Bbox {
        let own = self
            .elems
            .iter()
            .filter(|elem| elem.layer == layer)
            .fold(Bbox::empty(), |acc, elem| acc.union(elem.bbox()));
        self.insts.iter().fold(own, |acc, inst| {
            let bbox = inst.cell.layer_bbox(layer);
            if bbox.is_empty() {
                acc
            } else {
                acc.union(Bbox::new(bbox.p0 + inst.loc, bbox.p1 + inst.loc))
            }
        })
    }

    pub fn build(self) -> Cell {
        Cell {
            name: self.name,
            elems: self.elems,
            insts: self.insts,
            ports: self.ports,
        }
    }
}
