//! Layout cells, ports, vias, and routes.

use subgeom::Rect;

use self::cell::CellBuilder;
use self::port::Port;
use crate::error::{Error, ErrorSource, Result};
use crate::pdk::layers::GLayer;

pub mod cell;
pub mod port;
pub mod routing;
pub mod validation;
pub mod via;

/// Draws a rectangle on `layer` enclosing everything in `cell` by `padding` on all sides.
///
/// Returns the drawn rectangle.
pub fn add_padding(cell: &mut CellBuilder, layer: GLayer, padding: i64) -> Result<Rect> {
    let rect = cell.bbox().into_rect().ok_or_else(|| {
        Error::new(ErrorSource::InvalidLayout(format!(
            "cannot pad empty cell {}",
            cell.name()
        )))
    })?;
    let padded = rect.expand(padding);
    cell.draw_rect(layer, padded);
    Ok(padded)
}

/// Adds `{prefix}N`, `{prefix}E`, `{prefix}S`, and `{prefix}W` ports on the
/// perimeter of the geometry drawn on `layer`.
pub fn add_ports_perimeter(cell: &mut CellBuilder, layer: GLayer, prefix: &str) -> Result<()> {
    let rect = cell.layer_bbox(layer).into_rect().ok_or_else(|| {
        Error::new(ErrorSource::InvalidLayout(format!(
            "cell {} has no geometry on {layer}",
            cell.name()
        )))
    })?;
    cell.add_ports(Port::edges(prefix, rect, layer))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use subgeom::Point;

    use super::cell::Cell;
    use super::*;

    #[test]
    fn test_padding_and_perimeter() {
        let mut b = Cell::builder("padded");
        b.draw_rect(
            GLayer::ActiveTap,
            Rect::new(Point::new(-100, -50), Point::new(100, 50)),
        );
        let well = add_padding(&mut b, GLayer::Pwell, 130).unwrap();
        assert_eq!(well, Rect::new(Point::new(-230, -180), Point::new(230, 180)));

        add_ports_perimeter(&mut b, GLayer::Pwell, "well_").unwrap();
        let north = b.port("well_N").unwrap();
        assert_eq!(north.center(), Point::new(0, 180));
        assert_eq!(north.width(), 460);
        assert_eq!(b.port("well_W").unwrap().layer(), GLayer::Pwell);

        let err = add_ports_perimeter(&mut b, GLayer::Nwell, "nwell_").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidLayout(_)));
    }

    #[test]
    fn test_padding_empty_cell() {
        let mut b = Cell::builder("empty");
        assert!(add_padding(&mut b, GLayer::Pwell, 10).is_err());
    }
}
