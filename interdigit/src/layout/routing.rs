//! Point-to-point straight routes.

use std::sync::Arc;

use subgeom::{Dir, Point, Rect, Span};

use super::cell::{Cell, Instance};
use super::port::Port;
use super::via::via_stack;
use crate::error::{Error, Result};
use crate::pdk::MappedPdk;

/// Draws a straight route leaving `from` along its axis until it is level with `to`.
///
/// The route is drawn on `from`'s layer with `from`'s width, centered on
/// `from`'s track. Only the coordinate of `to` along the route axis matters:
/// a route between two ports on different tracks stays on the first port's
/// track. If the two ports are on different layers, a via stack is placed at
/// the far end of the route.
///
/// Exposes `route_N`, `route_E`, `route_S`, and `route_W` on the edges of the route.
pub fn straight_route(pdk: &dyn MappedPdk, from: &Port, to: &Port) -> Result<Cell> {
    let axis = from.orientation().axis();
    let along = Span::new(from.center().coord(axis), to.center().coord(axis));
    if along.length() == 0 {
        return Err(Error::infeasible(format!(
            "route from {} to {} has zero length",
            from.name(),
            to.name()
        )));
    }
    if from.width() <= 0 {
        return Err(Error::infeasible(format!(
            "cannot route from zero-width port {}",
            from.name()
        )));
    }

    let track = from.span();
    let rect = match axis {
        Dir::Horiz => Rect::from_spans(along, track),
        Dir::Vert => Rect::from_spans(track, along),
    };

    let layer = from.layer();
    let mut cell = Cell::builder(format!("route_{}_{}", from.name(), to.name()));
    cell.draw_rect(layer, rect);

    if to.layer() != layer {
        let (bottom, top) = if layer.level() < to.layer().level() {
            (layer, to.layer())
        } else {
            (to.layer(), layer)
        };
        let end = Point::from_dir_coords(
            axis,
            to.center().coord(axis),
            from.center().coord(!axis),
        );
        let stack = via_stack(pdk, bottom, top)?;
        cell.add_inst(Instance::new("via", Arc::new(stack), end));
    }

    cell.add_ports(Port::edges("route_", rect, layer))?;
    Ok(cell.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;
    use crate::layout::port::PortDir;
    use crate::pdk::layers::GLayer;
    use crate::tests::test_pdk;

    #[test]
    fn test_route_stays_on_first_track() {
        let pdk = test_pdk();
        let from = Port::new("a", Point::new(0, 100), 260, PortDir::W, GLayer::Met2);
        let to = Port::new("b", Point::new(5000, 900), 260, PortDir::E, GLayer::Met2);
        let route = straight_route(&pdk, &from, &to).unwrap();
        let bbox = route.bbox();
        assert_eq!(bbox.p0, Point::new(0, -30));
        assert_eq!(bbox.p1, Point::new(5000, 230));
        assert!(route.insts().is_empty());

        let east = route.port("route_E").unwrap();
        assert_eq!(east.center(), Point::new(5000, 100));
        assert_eq!(east.width(), 260);
        assert_eq!(route.port("route_N").unwrap().width(), 5000);
    }

    #[test]
    fn test_route_reversed_direction() {
        let pdk = test_pdk();
        let from = Port::new("b", Point::new(5000, 900), 260, PortDir::E, GLayer::Met2);
        let to = Port::new("a", Point::new(0, 100), 260, PortDir::W, GLayer::Met2);
        let route = straight_route(&pdk, &from, &to).unwrap();
        assert_eq!(route.bbox().center(), Point::new(2500, 900));
    }

    #[test]
    fn test_vertical_route_with_layer_change() {
        let pdk = test_pdk();
        let from = Port::new("a", Point::new(0, 0), 300, PortDir::N, GLayer::Met1);
        let to = Port::new("b", Point::new(700, 2000), 300, PortDir::S, GLayer::Met2);
        let route = straight_route(&pdk, &from, &to).unwrap();
        assert_eq!(route.insts().len(), 1);
        assert_eq!(route.insts()[0].loc(), Point::new(0, 2000));
        let rect = route.elems()[0].inner.as_rect().unwrap();
        assert_eq!(rect.hspan(), Span::new(-150, 150));
        assert_eq!(rect.vspan(), Span::new(0, 2000));
    }

    #[test]
    fn test_zero_length_route() {
        let pdk = test_pdk();
        let from = Port::new("a", Point::new(0, 0), 300, PortDir::E, GLayer::Met1);
        let err = straight_route(&pdk, &from, &from).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::Infeasible(_)));
    }
}
