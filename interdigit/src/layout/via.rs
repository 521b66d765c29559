//! Via towers and via arrays between routing levels.

use itertools::iproduct;
use subgeom::{Dims, Point, Rect, Span};

use super::cell::Cell;
use super::port::Port;
use crate::error::{Error, Result};
use crate::pdk::layers::GLayer;
use crate::pdk::MappedPdk;

/// The cut geometry joining one routing level to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CutSpec {
    via: GLayer,
    cut: i64,
    space: i64,
    enclosure: i64,
}

impl CutSpec {
    /// The smallest square that fits one cut with its enclosure.
    fn min_dim(&self) -> i64 {
        self.cut + 2 * self.enclosure
    }
}

fn level_of(layer: GLayer) -> Result<usize> {
    layer.level().ok_or_else(|| {
        Error::invalid_params(format!("{layer} is not a routing layer"))
    })
}

/// Collects the cut rules for every level transition from `bottom` up to `top`.
fn cut_specs(pdk: &dyn MappedPdk, bottom: GLayer, top: GLayer) -> Result<Vec<CutSpec>> {
    let lb = level_of(bottom)?;
    let lt = level_of(top)?;
    if lb >= lt {
        return Err(Error::invalid_params(format!(
            "via from {bottom} to {top} must go strictly upward"
        )));
    }

    (lb..lt)
        .map(|level| {
            let lower = if level == lb {
                Some(bottom)
            } else {
                GLayer::metal(level)
            };
            let (lower, upper, via) =
                match (lower, GLayer::metal(level + 1), GLayer::via_above(level)) {
                    (Some(lower), Some(upper), Some(via)) => (lower, upper, via),
                    _ => {
                        return Err(Error::invalid_params(format!(
                            "no via above routing level {level}"
                        )))
                    }
                };
            let rule = pdk.rule(via)?;
            let enclosure = pdk
                .rule_between(lower, via)?
                .min_enclosure()?
                .max(pdk.rule_between(upper, via)?.min_enclosure()?);
            Ok(CutSpec {
                via,
                cut: rule.min_width()?,
                space: rule.min_separation()?,
                enclosure,
            })
        })
        .collect()
}

/// The side length of the smallest square via tower between `bottom` and `top`.
pub fn via_min_dim(pdk: &dyn MappedPdk, bottom: GLayer, top: GLayer) -> Result<i64> {
    let dim = cut_specs(pdk, bottom, top)?
        .iter()
        .map(CutSpec::min_dim)
        .max()
        .unwrap_or_default();
    Ok(pdk.ceil_to_2xgrid(dim))
}

/// Positions `n` cuts of width `cut` spaced by `space`, centered in `span`.
fn cut_spans(pdk: &dyn MappedPdk, span: Span, n: i64, cut: i64, space: i64) -> Vec<Span> {
    let total = n * cut + (n - 1) * space;
    let start = pdk.snap_to_grid(span.center() - total / 2);
    (0..n)
        .map(|i| Span::with_start_and_length(start + i * (cut + space), cut))
        .collect()
}

/// Fills `area` with as many cuts as fit at every level from `bottom` to `top`.
///
/// Metal is drawn over `area` on every metal level of the stack. The bottom
/// layer is not drawn if it is poly or an active layer, since those belong to
/// the device being contacted.
///
/// Exposes `bottom_met_*` and `top_met_*` ports on the edges of `area`.
pub fn via_array(pdk: &dyn MappedPdk, bottom: GLayer, top: GLayer, area: Rect) -> Result<Cell> {
    let specs = cut_specs(pdk, bottom, top)?;
    let mut cell = Cell::builder(format!(
        "via_array_{bottom}_{top}_{}x{}",
        area.width(),
        area.height()
    ));

    for spec in specs.iter() {
        let usable = |len: i64| len - 2 * spec.enclosure;
        if usable(area.width()) < spec.cut || usable(area.height()) < spec.cut {
            return Err(Error::infeasible(format!(
                "{}x{} area cannot fit a {} cut with {} enclosure",
                area.width(),
                area.height(),
                spec.via,
                spec.enclosure
            )));
        }
        let count = |len: i64| ((usable(len) + spec.space) / (spec.cut + spec.space)).max(1);
        let xs = cut_spans(pdk, area.hspan(), count(area.width()), spec.cut, spec.space);
        let ys = cut_spans(pdk, area.vspan(), count(area.height()), spec.cut, spec.space);
        for (x, y) in iproduct!(xs.iter(), ys.iter()) {
            cell.draw_rect(spec.via, Rect::from_spans(*x, *y));
        }
    }

    let first_metal = level_of(bottom)?.max(1);
    for level in first_metal..=level_of(top)? {
        if let Some(metal) = GLayer::metal(level) {
            cell.draw_rect(metal, area);
        }
    }

    cell.add_ports(Port::edges("bottom_met_", area, bottom))?;
    cell.add_ports(Port::edges("top_met_", area, top))?;
    Ok(cell.build())
}

/// A single via tower between `bottom` and `top`, centered on the origin.
pub fn via_stack(pdk: &dyn MappedPdk, bottom: GLayer, top: GLayer) -> Result<Cell> {
    let dim = via_min_dim(pdk, bottom, top)?;
    let area = Rect::from_center_dims(Point::zero(), Dims::square(dim));
    Ok(via_array(pdk, bottom, top, area)?.with_name(format!("via_stack_{bottom}_{top}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;
    use crate::tests::test_pdk;

    #[test]
    fn test_via_stack_met1_met3() {
        let pdk = test_pdk();
        let stack = via_stack(&pdk, GLayer::Met1, GLayer::Met3).unwrap();
        // via2 needs the most room: 200 + 2 * 40.
        assert_eq!(via_min_dim(&pdk, GLayer::Met1, GLayer::Met3).unwrap(), 280);
        let bbox = stack.bbox();
        assert_eq!(bbox.width(), 280);
        assert_eq!(bbox.center(), Point::zero());

        let layers: Vec<_> = stack.elems().iter().map(|e| e.layer).collect();
        assert!(layers.contains(&GLayer::Via1));
        assert!(layers.contains(&GLayer::Via2));
        assert!(layers.contains(&GLayer::Met2));
        assert!(!layers.contains(&GLayer::Mcon));
        assert_eq!(stack.port("top_met_N").unwrap().layer(), GLayer::Met3);
        assert_eq!(stack.port("bottom_met_S").unwrap().layer(), GLayer::Met1);
    }

    #[test]
    fn test_via_array_counts_cuts() {
        let pdk = test_pdk();
        // mcon is 170 wide, 190 apart, enclosed by 40 in diff.
        let area = Rect::new(Point::new(0, 0), Point::new(250, 1000));
        let array = via_array(&pdk, GLayer::ActiveDiff, GLayer::Met1, area).unwrap();
        let cuts = array
            .elems()
            .iter()
            .filter(|e| e.layer == GLayer::Mcon)
            .count();
        // (1000 - 80 + 190) / 360 = 3 cuts tall, one wide.
        assert_eq!(cuts, 3);
        assert!(!array.elems().iter().any(|e| e.layer == GLayer::ActiveDiff));
        assert!(array.elems().iter().any(|e| e.layer == GLayer::Met1));
    }

    #[test]
    fn test_via_array_rejects_small_area() {
        let pdk = test_pdk();
        let area = Rect::new(Point::new(0, 0), Point::new(200, 200));
        let err = via_array(&pdk, GLayer::ActiveDiff, GLayer::Met1, area).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::Infeasible(_)));

        let err = via_stack(&pdk, GLayer::Met2, GLayer::Met1).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidParams(_)));
        let err = via_stack(&pdk, GLayer::Pwell, GLayer::Met1).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidParams(_)));
    }
}
