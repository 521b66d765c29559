//! Substrate and well tap rings.

use std::sync::Arc;

use arcstr::ArcStr;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use subgeom::ring::Ring;
use subgeom::{Dims, Point, Rect, Side};

use crate::error::{with_err_context, Error, ErrorContext, Result};
use crate::layout::cell::{Cell, Instance};
use crate::layout::port::Port;
use crate::layout::via::{via_array, via_min_dim};
use crate::pdk::layers::GLayer;
use crate::pdk::MappedPdk;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Builder, Serialize, Deserialize)]
pub struct TapRingParams {
    /// The dimensions of the area enclosed by the ring, centered on the origin.
    enclosed: Dims,
    /// The implant drawn over the tap diffusion.
    sdlayer: GLayer,
    /// The metal of the top and bottom sides.
    #[builder(default = "GLayer::Met2")]
    horizontal_glayer: GLayer,
    /// The metal of the left and right sides.
    #[builder(default = "GLayer::Met1")]
    vertical_glayer: GLayer,
}

impl TapRingParams {
    #[inline]
    pub fn builder() -> TapRingParamsBuilder {
        TapRingParamsBuilder::default()
    }

    #[inline]
    pub fn enclosed(&self) -> Dims {
        self.enclosed
    }
}

fn side_prefix(side: Side) -> &'static str {
    match side {
        Side::Top => "N_",
        Side::Right => "E_",
        Side::Bot => "S_",
        Side::Left => "W_",
    }
}

/// Draws a ring of contacted tap diffusion around a centered rectangle.
///
/// The enclosed dimensions are rounded up to twice the layout grid. The top
/// and bottom sides run the full width of the ring on the horizontal metal;
/// the left and right sides fit between them on the vertical metal, so the
/// two metals meet in the corners.
///
/// Publishes the metal edges of each side as `N_top_met_*`, `E_top_met_*`,
/// `S_top_met_*`, and `W_top_met_*`.
pub fn tapring(pdk: &dyn MappedPdk, params: &TapRingParams) -> Result<Cell> {
    let name = arcstr::format!(
        "tapring_{}x{}_{}",
        params.enclosed.w(),
        params.enclosed.h(),
        params.sdlayer
    );
    with_err_context(draw_tapring(pdk, params, name.clone()), || {
        ErrorContext::BuildDevice(name)
    })
}

fn draw_tapring(pdk: &dyn MappedPdk, params: &TapRingParams, name: ArcStr) -> Result<Cell> {
    let hlayer = params.horizontal_glayer;
    let vlayer = params.vertical_glayer;

    let width = pdk
        .rule(GLayer::ActiveTap)?
        .min_width()?
        .max(via_min_dim(pdk, GLayer::ActiveTap, hlayer)?)
        .max(via_min_dim(pdk, GLayer::ActiveTap, vlayer)?);
    let width = pdk.ceil_to_2xgrid(width);
    let enclosure = pdk
        .rule_between(params.sdlayer, GLayer::ActiveTap)?
        .min_enclosure()?;

    let dims = Dims::new(
        pdk.ceil_to_2xgrid(params.enclosed.w()),
        pdk.ceil_to_2xgrid(params.enclosed.h()),
    );
    if dims.w() <= 2 * enclosure || dims.h() <= 2 * enclosure {
        return Err(Error::infeasible(format!(
            "tap ring cannot enclose a {}x{} area",
            dims.w(),
            dims.h()
        )));
    }
    let inner = Rect::from_center_dims(Point::zero(), dims);

    let tap = Ring::builder().inner(inner).uniform_width(width).build()?;
    let implant = Ring::builder()
        .inner(inner.expand(-enclosure))
        .uniform_width(width + 2 * enclosure)
        .build()?;

    let mut cell = Cell::builder(name);
    cell.draw(GLayer::ActiveTap, tap);
    cell.draw(params.sdlayer, implant);

    for side in Side::ALL {
        let (metal, area) = match side {
            Side::Top | Side::Bot => (hlayer, tap.rect(side)),
            Side::Left | Side::Right => (vlayer, tap.inner_rect(side)),
        };
        let contacts = via_array(pdk, GLayer::ActiveTap, metal, area)?;
        let prefix = side_prefix(side);
        let ports: Vec<Port> = contacts
            .port_map()
            .ports_with_prefix("top_met_")
            .cloned()
            .collect();
        cell.add_inst(Instance::new(
            format!("{prefix}contacts"),
            Arc::new(contacts),
            Point::zero(),
        ));
        cell.add_ports_with_prefix(ports, prefix)?;
    }

    Ok(cell.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;
    use crate::layout::validation::validate_cell;
    use crate::tests::test_pdk;

    fn params(w: i64, h: i64) -> TapRingParams {
        TapRingParams::builder()
            .enclosed(Dims::new(w, h))
            .sdlayer(GLayer::PPlus)
            .build()
            .unwrap()
    }

    #[test]
    fn test_tapring_geometry() {
        let pdk = test_pdk();
        let ring = tapring(&pdk, &params(1000, 600)).unwrap();

        // Contacting met2 needs 260 nm of tap.
        let north = ring.port("N_top_met_N").unwrap();
        assert_eq!(north.center(), Point::new(0, 560));
        assert_eq!(north.layer(), GLayer::Met2);
        assert_eq!(north.width(), 1520);

        let west = ring.port("W_top_met_W").unwrap();
        assert_eq!(west.center(), Point::new(-760, 0));
        assert_eq!(west.layer(), GLayer::Met1);
        assert_eq!(west.width(), 600);

        // The implant extends 125 nm past the tap on both sides.
        let bbox = ring.bbox();
        assert_eq!(bbox.p0, Point::new(-885, -685));
        assert_eq!(bbox.p1, Point::new(885, 685));

        let tap = ring.layer_bbox(GLayer::ActiveTap);
        assert_eq!(tap.width(), 1520);
        assert!(ring.port("N_bottom_met_N").is_err());
        assert!(!validate_cell(&ring, pdk.layout_grid()).has_errors());
    }

    #[test]
    fn test_tapring_rounds_enclosure() {
        let pdk = test_pdk();
        let ring = tapring(&pdk, &params(1003, 601)).unwrap();
        assert_eq!(ring.port("E_top_met_W").unwrap().center().x, 505);
        assert_eq!(ring.port("S_top_met_N").unwrap().center().y, -305);
        assert!(!validate_cell(&ring, pdk.layout_grid()).has_errors());
    }

    #[test]
    fn test_tapring_too_small() {
        let pdk = test_pdk();
        let err = tapring(&pdk, &params(100, 100)).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::Infeasible(_)));
    }
}
