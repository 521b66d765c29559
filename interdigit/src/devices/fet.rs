//! Multi-finger field-effect transistors with routed terminals.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use arcstr::ArcStr;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use subgeom::bbox::BoundBox;
use subgeom::{is_on_grid, Point, Rect, Span};

use crate::error::{with_err_context, Error, ErrorContext, Result};
use crate::layout::cell::{Cell, CellBuilder, Instance};
use crate::layout::port::Port;
use crate::layout::via::{via_array, via_min_dim, via_stack};
use crate::pdk::layers::GLayer;
use crate::pdk::MappedPdk;

/// The polarity of a transistor.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetKind {
    #[default]
    Nfet,
    Pfet,
}

impl FetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nfet => "nfet",
            Self::Pfet => "pfet",
        }
    }

    /// The source/drain implant of the device.
    pub fn sdlayer(&self) -> GLayer {
        match self {
            Self::Nfet => GLayer::NPlus,
            Self::Pfet => GLayer::PPlus,
        }
    }

    /// The implant of a tap that ties the device's well.
    pub fn tie_sdlayer(&self) -> GLayer {
        match self {
            Self::Nfet => GLayer::PPlus,
            Self::Pfet => GLayer::NPlus,
        }
    }

    /// The well the device sits in.
    pub fn well(&self) -> GLayer {
        match self {
            Self::Nfet => GLayer::Pwell,
            Self::Pfet => GLayer::Nwell,
        }
    }
}

impl Display for FetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FetKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "nfet" => Ok(Self::Nfet),
            "pfet" => Ok(Self::Pfet),
            other => Err(Error::invalid_params(format!(
                "unsupported device polarity `{other}`, expected `nfet` or `pfet`"
            ))),
        }
    }
}

/// The parameters of a transistor that a caller may choose.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Builder, Serialize, Deserialize)]
pub struct DeviceShape {
    /// The width of each finger, in nanometers.
    #[builder(default = "3000")]
    pub width: i64,
    /// The gate length, in nanometers.
    #[builder(default = "150")]
    pub length: i64,
    /// The number of fingers.
    #[builder(default = "1")]
    pub fingers: u64,
    /// Multiplies the width of the terminal routes.
    #[builder(default = "1")]
    pub rmult: u64,
    #[builder(default = "GLayer::Met2")]
    pub sd_route_layer: GLayer,
    #[builder(default = "GLayer::Met2")]
    pub gate_route_layer: GLayer,
}

impl DeviceShape {
    #[inline]
    pub fn builder() -> DeviceShapeBuilder {
        DeviceShapeBuilder::default()
    }
}

impl Default for DeviceShape {
    fn default() -> Self {
        Self {
            width: 3000,
            length: 150,
            fingers: 1,
            rmult: 1,
            sd_route_layer: GLayer::Met2,
            gate_route_layer: GLayer::Met2,
        }
    }
}

/// Everything needed to draw one transistor.
///
/// The route extensions, implant, and dummies are decided by the generator
/// that places the device, so they can only be set from within this crate.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MultiplierParams {
    shape: DeviceShape,
    sdlayer: GLayer,
    sd_route_extension: i64,
    gate_route_extension: i64,
    dummy: (bool, bool),
}

impl MultiplierParams {
    /// A device of the given shape and polarity, with no dummies and no route extension.
    pub(crate) fn for_row(shape: &DeviceShape, kind: FetKind) -> Self {
        Self {
            shape: *shape,
            sdlayer: kind.sdlayer(),
            sd_route_extension: 0,
            gate_route_extension: 0,
            dummy: (false, false),
        }
    }

    pub(crate) fn with_dummy(mut self, left: bool, right: bool) -> Self {
        self.dummy = (left, right);
        self
    }

    pub(crate) fn with_extension(mut self, sd: i64, gate: i64) -> Self {
        self.sd_route_extension = sd;
        self.gate_route_extension = gate;
        self
    }

    #[inline]
    pub fn shape(&self) -> &DeviceShape {
        &self.shape
    }

    #[inline]
    pub fn sdlayer(&self) -> GLayer {
        self.sdlayer
    }

    #[inline]
    pub fn sd_route_extension(&self) -> i64 {
        self.sd_route_extension
    }

    #[inline]
    pub fn gate_route_extension(&self) -> i64 {
        self.gate_route_extension
    }

    /// Whether the device has a dummy on its (left, right) side.
    #[inline]
    pub fn dummy(&self) -> (bool, bool) {
        self.dummy
    }
}

impl Display for MultiplierParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let implant = match self.sdlayer {
            GLayer::PPlus => "p",
            _ => "n",
        };
        write!(
            f,
            "fet_{implant}_w{}_l{}_nf{}_rm{}_{}_{}_sde{}_gde{}",
            self.shape.width,
            self.shape.length,
            self.shape.fingers,
            self.shape.rmult,
            self.shape.sd_route_layer,
            self.shape.gate_route_layer,
            self.sd_route_extension,
            self.gate_route_extension
        )?;
        if self.dummy.0 {
            write!(f, "_dl")?;
        }
        if self.dummy.1 {
            write!(f, "_dr")?;
        }
        Ok(())
    }
}

/// The largest coordinate a layout may use, matching GDS's 32-bit coordinates.
const MAX_COORD: i64 = i32::MAX as i64;

/// Finger dimensions shared by the main device and its dummies.
struct Fingers {
    width: i64,
    length: i64,
    /// Width of a contacted source/drain strip.
    strip: i64,
    /// Distance between the starts of adjacent strips.
    pitch: i64,
    /// Side length of a gate contact pad.
    pad: i64,
    /// Poly extension past the diffusion.
    overhang: i64,
}

impl Fingers {
    fn new(pdk: &dyn MappedPdk, shape: &DeviceShape) -> Result<Self> {
        let strip = via_min_dim(pdk, GLayer::ActiveDiff, GLayer::Met1)?;
        let pad = via_min_dim(pdk, GLayer::Poly, GLayer::Met1)?;
        let gate_space = pdk
            .rule_between(GLayer::Poly, GLayer::Mcon)?
            .min_separation()?;
        let poly_space = pdk.rule(GLayer::Poly)?.min_separation()?;
        let overhang = pdk
            .rule_between(GLayer::Poly, GLayer::ActiveDiff)?
            .min_enclosure()?;

        let pitch = (strip + 2 * gate_space + shape.length)
            .max(pad.max(shape.length) + poly_space);

        Ok(Self {
            width: shape.width,
            length: shape.length,
            strip,
            pitch: pdk.ceil_to_2xgrid(pitch),
            pad,
            overhang,
        })
    }

    /// Diffusion length for `nf` fingers.
    fn diff_len(&self, nf: i64) -> Result<i64> {
        nf.checked_mul(self.pitch)
            .and_then(|len| len.checked_add(self.strip))
            .filter(|len| *len <= MAX_COORD)
            .ok_or_else(|| Error::infeasible(format!("{nf} fingers do not fit in the layout")))
    }

    /// The `j`-th source/drain strip of a diffusion starting at `x0`.
    fn strip(&self, x0: i64, j: i64) -> Rect {
        Rect::from_spans(
            Span::with_start_and_length(x0 + j * self.pitch, self.strip),
            Span::new(0, self.width),
        )
    }

    /// The horizontal center of the `i`-th gate of a diffusion starting at `x0`.
    fn gate_center(&self, x0: i64, i: i64) -> i64 {
        x0 + i * self.pitch + self.strip + (self.pitch - self.strip) / 2
    }

    /// The poly of the `i`-th gate, running from `bottom` to past the top of the diffusion.
    fn gate(&self, pdk: &dyn MappedPdk, x0: i64, i: i64, bottom: i64) -> Rect {
        let start = pdk.snap_to_grid(self.gate_center(x0, i) - self.length / 2);
        Rect::from_spans(
            Span::with_start_and_length(start, self.length),
            Span::new(bottom, self.width + self.overhang),
        )
    }

    /// The vertical span of the gate contact pads.
    fn pad_vspan(&self) -> Span {
        Span::with_stop_and_length(-self.overhang, self.pad)
    }
}

/// The width of a terminal route on `layer`.
fn route_width(pdk: &dyn MappedPdk, layer: GLayer, rmult: u64) -> Result<i64> {
    let min_width = pdk.rule(layer)?.min_width()?;
    let width = i64::try_from(rmult)
        .ok()
        .and_then(|rmult| min_width.checked_mul(rmult))
        .filter(|width| *width <= MAX_COORD)
        .ok_or_else(|| Error::infeasible(format!("route width multiplier {rmult} is too large")))?;
    Ok(pdk.ceil_to_2xgrid(width.max(via_min_dim(pdk, GLayer::Met1, layer)?)))
}

fn validate(pdk: &dyn MappedPdk, params: &MultiplierParams) -> Result<()> {
    let shape = &params.shape;

    for layer in [shape.sd_route_layer, shape.gate_route_layer] {
        if !matches!(layer.level(), Some(level) if level >= 2) {
            return Err(Error::invalid_params(format!(
                "terminal routes must be on met2 or above, got {layer}"
            )));
        }
    }
    if !matches!(params.sdlayer, GLayer::NPlus | GLayer::PPlus) {
        return Err(Error::invalid_params(format!(
            "{} is not a source/drain implant",
            params.sdlayer
        )));
    }

    if shape.fingers < 1 {
        return Err(Error::infeasible("a device needs at least one finger"));
    }
    if shape.rmult < 1 {
        return Err(Error::infeasible("route width multiplier must be at least 1"));
    }

    let grid = pdk.layout_grid();
    for (name, value) in [
        ("width", shape.width),
        ("length", shape.length),
        ("source/drain route extension", params.sd_route_extension),
        ("gate route extension", params.gate_route_extension),
    ] {
        if !is_on_grid(value, grid) {
            return Err(Error::infeasible(format!(
                "{name} {value} is not a multiple of the {grid} nm grid"
            )));
        }
    }
    if params.sd_route_extension < 0 || params.gate_route_extension < 0 {
        return Err(Error::infeasible("route extensions cannot be negative"));
    }

    let wmin = pdk
        .rule(GLayer::ActiveDiff)?
        .min_width()?
        .max(via_min_dim(pdk, GLayer::ActiveDiff, GLayer::Met1)?);
    if shape.width < wmin {
        return Err(Error::infeasible(format!(
            "width {} is below the minimum contacted width {wmin}",
            shape.width
        )));
    }
    let lmin = pdk.rule(GLayer::Poly)?.min_width()?;
    if shape.length < lmin {
        return Err(Error::infeasible(format!(
            "length {} is below the minimum gate length {lmin}",
            shape.length
        )));
    }
    for (name, value) in [
        ("width", shape.width),
        ("length", shape.length),
        ("source/drain route extension", params.sd_route_extension),
        ("gate route extension", params.gate_route_extension),
    ] {
        if value > MAX_COORD {
            return Err(Error::infeasible(format!("{name} {value} is out of range")));
        }
    }

    Ok(())
}

/// Draws a single-finger dummy device whose diffusion starts at `x0`.
///
/// Publishes the edges of the dummy diffusion as `{prefix}N`, `{prefix}E`,
/// `{prefix}S`, and `{prefix}W`.
fn draw_dummy(
    pdk: &dyn MappedPdk,
    cell: &mut CellBuilder,
    fingers: &Fingers,
    contact: &Arc<Cell>,
    x0: i64,
    prefix: &str,
) -> Result<Rect> {
    let diff = Rect::from_spans(
        Span::with_start_and_length(x0, fingers.diff_len(1)?),
        Span::new(0, fingers.width),
    );
    cell.draw_rect(GLayer::ActiveDiff, diff);
    cell.draw_rect(
        GLayer::Poly,
        fingers.gate(pdk, x0, 0, -fingers.overhang),
    );
    for j in 0..2 {
        cell.add_inst(Instance::new(
            format!("{prefix}contact_{j}"),
            contact.clone(),
            Point::new(x0 + j * fingers.pitch, 0),
        ));
    }
    cell.add_ports(Port::edges(prefix, diff, GLayer::ActiveDiff))?;
    Ok(diff)
}

/// Draws a multi-finger transistor.
///
/// The diffusion starts at the origin and runs to the right, with the
/// source/drain routes above it and the gate route below. Even strips are
/// sources and odd strips are drains.
///
/// Publishes `diff_*`, `plusdoped_*`, `source_*`, `drain_*`, `gate_*`, and
/// `row0_col{i}_gate_*` for every gate contact, plus `dummy_L_*` and
/// `dummy_R_*` for any dummies.
pub fn multiplier(pdk: &dyn MappedPdk, params: &MultiplierParams) -> Result<Cell> {
    let name = arcstr::format!("{params}");
    with_err_context(draw_multiplier(pdk, params, name.clone()), || {
        ErrorContext::BuildDevice(name)
    })
}

fn draw_multiplier(pdk: &dyn MappedPdk, params: &MultiplierParams, name: ArcStr) -> Result<Cell> {
    validate(pdk, params)?;

    let shape = &params.shape;
    let nf = i64::try_from(shape.fingers)
        .map_err(|_| Error::infeasible(format!("{} fingers is too many", shape.fingers)))?;
    let fingers = Fingers::new(pdk, shape)?;
    let diff_len = fingers.diff_len(nf)?;
    let xspan = Span::new(0, diff_len);

    let mut cell = Cell::builder(name);

    let diff = Rect::from_spans(xspan, Span::new(0, fingers.width));
    cell.draw_rect(GLayer::ActiveDiff, diff);
    cell.add_ports(Port::edges("diff_", diff, GLayer::ActiveDiff))?;

    let contact = Arc::new(via_array(
        pdk,
        GLayer::ActiveDiff,
        GLayer::Met1,
        fingers.strip(0, 0),
    )?);

    // Gates and their contact pads.
    let pad_vspan = fingers.pad_vspan();
    let gate_contact = Arc::new(via_array(
        pdk,
        GLayer::Poly,
        GLayer::Met1,
        Rect::from_spans(Span::from_center_span(0, fingers.pad), pad_vspan),
    )?);
    let mut gate_xs = Vec::new();
    for i in 0..nf {
        let cx = fingers.gate_center(0, i);
        cell.draw_rect(GLayer::Poly, fingers.gate(pdk, 0, i, pad_vspan.start()));
        let pad = Rect::from_spans(Span::from_center_span(cx, fingers.pad), pad_vspan);
        cell.draw_rect(GLayer::Poly, pad);
        cell.add_inst(Instance::new(
            format!("gate_contact_{i}"),
            gate_contact.clone(),
            Point::new(cx, 0),
        ));
        cell.add_ports(Port::edges(
            &format!("row0_col{i}_gate_"),
            pad,
            GLayer::Met1,
        ))?;
        gate_xs.push(cx);
    }

    // Source and drain routes.
    let sd_layer = shape.sd_route_layer;
    let sd_width = route_width(pdk, sd_layer, shape.rmult)?;
    let sd_space = pdk.rule(sd_layer)?.min_separation()?;
    let source = Rect::from_spans(
        xspan,
        Span::with_start_and_length(
            fingers.width + sd_space + params.sd_route_extension,
            sd_width,
        ),
    );
    let drain = Rect::from_spans(
        xspan,
        Span::with_start_and_length(source.top() + sd_space, sd_width),
    );
    cell.draw_rect(sd_layer, source);
    cell.draw_rect(sd_layer, drain);
    cell.add_ports(Port::edges("source_", source, sd_layer))?;
    cell.add_ports(Port::edges("drain_", drain, sd_layer))?;

    let sd_via = Arc::new(via_stack(pdk, GLayer::Met1, sd_layer)?);
    for j in 0..=nf {
        let strip = fingers.strip(0, j);
        let rail = if j % 2 == 0 { source } else { drain };
        let y = rail.center().y;
        cell.add_inst(Instance::new(
            format!("sd_contact_{j}"),
            contact.clone(),
            Point::new(j * fingers.pitch, 0),
        ));
        cell.draw_rect(
            GLayer::Met1,
            Rect::from_spans(strip.hspan(), Span::new(fingers.width, y)),
        );
        cell.add_inst(Instance::new(
            format!("sd_via_{j}"),
            sd_via.clone(),
            Point::new(strip.center().x, y),
        ));
    }

    // Gate route.
    let gate_layer = shape.gate_route_layer;
    let gate_width = route_width(pdk, gate_layer, shape.rmult)?;
    let gate_space = pdk.rule(gate_layer)?.min_separation()?;
    let gate = Rect::from_spans(
        xspan,
        Span::with_stop_and_length(
            pad_vspan.start() - gate_space - params.gate_route_extension,
            gate_width,
        ),
    );
    cell.draw_rect(gate_layer, gate);
    cell.add_ports(Port::edges("gate_", gate, gate_layer))?;

    let jumper = via_min_dim(pdk, GLayer::Met1, gate_layer)?;
    let gate_via = Arc::new(via_stack(pdk, GLayer::Met1, gate_layer)?);
    let y = gate.center().y;
    for (i, cx) in gate_xs.into_iter().enumerate() {
        cell.draw_rect(
            GLayer::Met1,
            Rect::from_spans(
                Span::from_center_span(cx, jumper),
                Span::new(y, pad_vspan.start()),
            ),
        );
        cell.add_inst(Instance::new(
            format!("gate_via_{i}"),
            gate_via.clone(),
            Point::new(cx, y),
        ));
    }

    // Dummies sit one diffusion space away on either side.
    let diff_space = pdk.rule(GLayer::ActiveDiff)?.min_separation()?;
    let mut diffs = vec![diff];
    let (left, right) = params.dummy;
    if left {
        let x0 = -diff_space - fingers.diff_len(1)?;
        diffs.push(draw_dummy(
            pdk, &mut cell, &fingers, &contact, x0, "dummy_L_",
        )?);
    }
    if right {
        let x0 = diff_len + diff_space;
        diffs.push(draw_dummy(
            pdk, &mut cell, &fingers, &contact, x0, "dummy_R_",
        )?);
    }

    let enclosure = pdk
        .rule_between(params.sdlayer, GLayer::ActiveDiff)?
        .min_enclosure()?;
    let implant = Rect::from(diffs.bbox()).expand(enclosure);
    cell.draw_rect(params.sdlayer, implant);
    cell.add_ports(Port::edges("plusdoped_", implant, params.sdlayer))?;

    Ok(cell.build())
}
