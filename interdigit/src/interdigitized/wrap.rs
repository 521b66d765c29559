//! Guard rings around an interdigitized pair.

use std::sync::Arc;

use arcstr::ArcStr;
use subgeom::bbox::Bbox;
use subgeom::{Dims, Point};

use super::{two_transistor_interdigitized, WrappedParams};
use crate::devices::fet::FetKind;
use crate::devices::tapring::{tapring, TapRingParams};
use crate::error::{with_err_context, Error, ErrorContext, ErrorSource, Result};
use crate::layout::cell::{Cell, CellBuilder, Instance};
use crate::layout::{add_padding, add_ports_perimeter};
use crate::log::info;
use crate::pdk::layers::GLayer;
use crate::pdk::MappedPdk;

/// An interdigitized pair of nfets in a tied pwell, optionally surrounded by
/// a substrate tap.
///
/// On top of the ports of [`two_transistor_interdigitized`], publishes the
/// well tie as `welltie_*`, the well outline as `well_N`, `well_E`,
/// `well_S`, and `well_W`, and the substrate tap as `substratetap_*`.
pub fn two_nfet_interdigitized(pdk: &dyn MappedPdk, params: &WrappedParams) -> Result<Cell> {
    wrapped(pdk, FetKind::Nfet, params)
}

/// The pfet counterpart of [`two_nfet_interdigitized`], with the devices in
/// a tied nwell.
pub fn two_pfet_interdigitized(pdk: &dyn MappedPdk, params: &WrappedParams) -> Result<Cell> {
    wrapped(pdk, FetKind::Pfet, params)
}

fn wrapped(pdk: &dyn MappedPdk, kind: FetKind, params: &WrappedParams) -> Result<Cell> {
    let core = two_transistor_interdigitized(pdk, &params.core(kind))?;
    let name = arcstr::format!(
        "{}_tie{}_sub{}",
        core.name(),
        u8::from(params.with_tie),
        u8::from(params.with_substrate_tap)
    );
    let cell = with_err_context(draw_wrapped(pdk, kind, params, core, name.clone()), || {
        ErrorContext::Wrap(name)
    })?;
    cell.validate(pdk.layout_grid())?;

    info!("generated {}", cell.name());
    Ok(cell)
}

/// The largest distance from the origin reached by the cell in each axis.
fn half_extent(bbox: Bbox) -> Result<(i64, i64)> {
    if bbox.is_empty() {
        return Err(Error::new(ErrorSource::Internal(
            "cannot ring an empty cell".to_string(),
        )));
    }
    Ok((
        bbox.p1.x.max(-bbox.p0.x),
        bbox.p1.y.max(-bbox.p0.y),
    ))
}

/// Adds a tap ring that clears everything drawn so far by `space`.
fn add_ring(
    pdk: &dyn MappedPdk,
    cell: &mut CellBuilder,
    sdlayer: GLayer,
    space: i64,
    prefix: &str,
) -> Result<()> {
    let (xmax, ymax) = half_extent(cell.bbox())?;
    let params = TapRingParams::builder()
        .enclosed(Dims::new(2 * (space + xmax), 2 * (space + ymax)))
        .sdlayer(sdlayer)
        .horizontal_glayer(GLayer::Met2)
        .vertical_glayer(GLayer::Met1)
        .build()
        .map_err(|err| Error::new(ErrorSource::Internal(err.to_string())))?;
    let ring = tapring(pdk, &params)?;
    cell.add_ports_with_prefix(ring.ports().cloned(), prefix)?;
    cell.add_inst(Instance::new(
        prefix.trim_end_matches('_'),
        Arc::new(ring),
        Point::zero(),
    ));
    Ok(())
}

fn draw_wrapped(
    pdk: &dyn MappedPdk,
    kind: FetKind,
    params: &WrappedParams,
    core: Cell,
    name: ArcStr,
) -> Result<Cell> {
    let mut cell = core.with_name(name).into_builder();

    if params.with_tie {
        let space = [
            pdk.rule(GLayer::Met2)?.min_separation()?,
            pdk.rule(GLayer::Met1)?.min_separation()?,
            pdk.rule_between(GLayer::ActiveDiff, GLayer::ActiveTap)?
                .min_separation()?,
        ]
        .into_iter()
        .max()
        .unwrap_or_default();
        let enclosure = pdk
            .rule_between(kind.tie_sdlayer(), GLayer::ActiveTap)?
            .min_enclosure()?;
        add_ring(pdk, &mut cell, kind.tie_sdlayer(), space + enclosure, "welltie_")?;
    }

    let well = kind.well();
    let enclosure = pdk.rule_between(well, GLayer::ActiveTap)?.min_enclosure()?;
    add_padding(&mut cell, well, enclosure)?;
    add_ports_perimeter(&mut cell, well, "well_")?;

    if params.with_substrate_tap {
        let space = pdk
            .rule_between(GLayer::Dnwell, GLayer::ActiveTap)?
            .min_separation()?;
        add_ring(pdk, &mut cell, GLayer::PPlus, space, "substratetap_")?;
    }

    Ok(cell.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interdigitized::InterdigitizedParams;
    use crate::tests::test_pdk;

    fn params(with_tie: bool, with_substrate_tap: bool) -> WrappedParams {
        WrappedParams::builder()
            .numcols(2)
            .with_tie(with_tie)
            .with_substrate_tap(with_substrate_tap)
            .build()
            .unwrap()
    }

    #[test]
    fn test_wrapped_exceeds_core() {
        let pdk = test_pdk();
        let core = two_transistor_interdigitized(
            &pdk,
            &InterdigitizedParams::builder().numcols(2).build().unwrap(),
        )
        .unwrap();
        let wrapped = two_nfet_interdigitized(&pdk, &params(true, true)).unwrap();

        // max(140, 140, 130) + 125
        let tap_sep = 265;
        let (core, wrapped) = (core.bbox(), wrapped.bbox());
        assert!(wrapped.width() - core.width() >= 2 * tap_sep);
        assert!(wrapped.height() - core.height() >= 2 * tap_sep);
    }

    #[test]
    fn test_wrapped_ports() {
        let pdk = test_pdk();
        let cell = two_nfet_interdigitized(&pdk, &params(true, true)).unwrap();
        assert!(cell.port("welltie_N_top_met_N").is_ok());
        assert!(cell.port("substratetap_W_top_met_W").is_ok());
        assert!(cell.port("A_source_E").is_ok());
        assert!(cell.port("B_1_gate_N").is_ok());

        let well = cell.port("well_N").unwrap();
        assert_eq!(well.layer(), GLayer::Pwell);
        let tie = cell.port("welltie_N_top_met_N").unwrap();
        let sub = cell.port("substratetap_N_top_met_N").unwrap();
        assert!(tie.center().y < well.center().y);
        assert!(well.center().y < sub.center().y);

        // The well encloses the tie ring, whose implant overhangs its tap by 125 nm.
        let tap = cell.inst("welltie").unwrap().cell().layer_bbox(GLayer::ActiveTap);
        assert_eq!(well.center().y, tap.p1.y + 125 + 130);
        assert!(cell.name().ends_with("_tie1_sub1"));
    }

    #[test]
    fn test_optional_rings() {
        let pdk = test_pdk();
        let bare = two_nfet_interdigitized(&pdk, &params(false, false)).unwrap();
        assert!(bare.port("well_E").is_ok());
        assert!(bare.port("welltie_N_top_met_N").is_err());
        assert!(bare.port("substratetap_N_top_met_N").is_err());

        let tied = two_nfet_interdigitized(&pdk, &params(true, false)).unwrap();
        assert!(tied.bbox().width() > bare.bbox().width());
    }

    #[test]
    fn test_pfet_wrapping() {
        let pdk = test_pdk();
        let cell = two_pfet_interdigitized(&pdk, &params(true, true)).unwrap();
        assert_eq!(cell.port("well_W").unwrap().layer(), GLayer::Nwell);
        let tie = cell.inst("welltie").unwrap().cell();
        assert!(!tie.layer_bbox(GLayer::NPlus).is_empty());
        let sub = cell.inst("substratetap").unwrap().cell();
        assert!(!sub.layer_bbox(GLayer::PPlus).is_empty());
        assert!(cell.name().starts_with("two_pfet_interdigitized"));
    }
}
