//! Interdigitized placement of two identical transistors.
//!
//! Devices A and B alternate along a single row (A-B-A-B...). Device B's
//! terminal routes are pushed further from the diffusion than device A's, so
//! that after every like-named terminal is merged into a rail spanning the
//! row, A's rails and B's rails sit on separate tracks.

use std::str::FromStr;

use arcstr::ArcStr;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub use crate::devices::fet::{DeviceShape, FetKind};
use crate::error::{with_err_context, Error, ErrorContext, Result};
use crate::layout::cell::Cell;
use crate::log::info;
use crate::pdk::MappedPdk;

pub mod rails;
pub mod row;
pub mod wrap;

pub use self::rails::{RailClass, RailMerger};
pub use self::row::{DeviceRole, Placement, RowAssembly, RowBuilder, TerminalExtension};
pub use self::wrap::{two_nfet_interdigitized, two_pfet_interdigitized};

/// Where to place dummy devices at the ends of the row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DummySpec {
    /// Dummies on both ends, or on neither.
    Both(bool),
    /// Independent (left, right) dummies.
    Sides(bool, bool),
}

impl DummySpec {
    /// Normalizes to a (left, right) pair.
    pub fn sides(&self) -> (bool, bool) {
        match *self {
            Self::Both(both) => (both, both),
            Self::Sides(left, right) => (left, right),
        }
    }
}

impl Default for DummySpec {
    fn default() -> Self {
        Self::Both(true)
    }
}

impl From<bool> for DummySpec {
    fn from(value: bool) -> Self {
        Self::Both(value)
    }
}

impl From<(bool, bool)> for DummySpec {
    fn from((left, right): (bool, bool)) -> Self {
        Self::Sides(left, right)
    }
}

impl FromStr for DummySpec {
    type Err = Error;

    /// Parses `true`, `false`, or a comma-separated `left,right` pair.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim().parse::<bool>().map_err(|_| {
                Error::invalid_params(format!("invalid dummy specification `{s}`"))
            })
        };
        match s.split_once(',') {
            Some((left, right)) => Ok(Self::Sides(parse(left)?, parse(right)?)),
            None => Ok(Self::Both(parse(s)?)),
        }
    }
}

/// Parameters for [`two_transistor_interdigitized`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Builder, Serialize, Deserialize)]
pub struct InterdigitizedParams {
    /// The number of A-B column pairs.
    #[builder(default = "1")]
    pub numcols: usize,
    #[builder(default)]
    pub kind: FetKind,
    #[builder(default, setter(into))]
    pub dummy: DummySpec,
    #[builder(default)]
    pub shape: DeviceShape,
}

impl InterdigitizedParams {
    #[inline]
    pub fn builder() -> InterdigitizedParamsBuilder {
        InterdigitizedParamsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.numcols < 1 {
            return Err(Error::invalid_params("numcols must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn cell_name(&self) -> ArcStr {
        let (left, right) = self.dummy.sides();
        arcstr::format!(
            "two_{}_interdigitized_c{}_w{}_l{}_nf{}_rm{}_{}_{}_d{}{}",
            self.kind,
            self.numcols,
            self.shape.width,
            self.shape.length,
            self.shape.fingers,
            self.shape.rmult,
            self.shape.sd_route_layer,
            self.shape.gate_route_layer,
            u8::from(left),
            u8::from(right)
        )
    }
}

/// Parameters for the guard-ringed generators in [`wrap`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Builder, Serialize, Deserialize)]
pub struct WrappedParams {
    #[builder(default = "1")]
    pub numcols: usize,
    #[builder(default, setter(into))]
    pub dummy: DummySpec,
    /// Surround the design with a `p+s/d` substrate tap.
    #[builder(default = "true")]
    pub with_substrate_tap: bool,
    /// Surround the devices with a ring tying their well.
    #[builder(default = "true")]
    pub with_tie: bool,
    #[builder(default)]
    pub shape: DeviceShape,
}

impl WrappedParams {
    #[inline]
    pub fn builder() -> WrappedParamsBuilder {
        WrappedParamsBuilder::default()
    }

    /// The parameters of the unwrapped core.
    pub fn core(&self, kind: FetKind) -> InterdigitizedParams {
        InterdigitizedParams {
            numcols: self.numcols,
            kind,
            dummy: self.dummy,
            shape: self.shape,
        }
    }
}

/// Places two identical transistors in an interdigitized A-B-A-B row and
/// merges their terminals into rails.
///
/// Every placement's ports are republished as `A_{k}_*` or `B_{k}_*`, where
/// `k` is the column. The rails are published as `A_source_*`, `B_source_*`,
/// `A_drain_*`, `B_drain_*`, `A_gate_*`, and `B_gate_*`. The result is
/// centered on the origin.
pub fn two_transistor_interdigitized(
    pdk: &dyn MappedPdk,
    params: &InterdigitizedParams,
) -> Result<Cell> {
    params.validate()?;

    let row = with_err_context(RowBuilder::new(pdk, params).build(), || {
        ErrorContext::BuildRow {
            numcols: params.numcols,
        }
    })?;
    let cell = with_err_context(
        RailMerger::new(pdk).merge(&row, params.cell_name()),
        || ErrorContext::MergeRails,
    )?;
    cell.validate(pdk.layout_grid())?;

    info!(
        "generated {} with {} placements at pitch {}",
        cell.name(),
        row.len(),
        row.pitch()
    );
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;
    use crate::pdk::layers::GLayer;

    #[test]
    fn test_dummy_spec() {
        assert_eq!(DummySpec::default().sides(), (true, true));
        assert_eq!(DummySpec::from(false).sides(), (false, false));
        assert_eq!(DummySpec::from((true, false)).sides(), (true, false));
        assert_eq!(
            "true, false".parse::<DummySpec>().unwrap(),
            DummySpec::Sides(true, false)
        );
        assert_eq!("false".parse::<DummySpec>().unwrap(), DummySpec::Both(false));
        let err = "yes".parse::<DummySpec>().unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidParams(_)));
    }

    #[test]
    fn test_dummy_spec_serde() {
        let sides: DummySpec = serde_json::from_str("[false, true]").unwrap();
        assert_eq!(sides, DummySpec::Sides(false, true));
        let both: DummySpec = serde_json::from_str("true").unwrap();
        assert_eq!(both, DummySpec::Both(true));
    }

    #[test]
    fn test_params_defaults() {
        let params = InterdigitizedParams::builder()
            .numcols(3)
            .dummy((true, false))
            .build()
            .unwrap();
        assert_eq!(params.kind, FetKind::Nfet);
        assert_eq!(params.shape, DeviceShape::default());
        assert_eq!(
            params.cell_name(),
            "two_nfet_interdigitized_c3_w3000_l150_nf1_rm1_met2_met2_d10"
        );
        let routed = InterdigitizedParams {
            shape: DeviceShape {
                rmult: 2,
                gate_route_layer: GLayer::Met3,
                ..params.shape
            },
            ..params
        };
        assert_eq!(
            routed.cell_name(),
            "two_nfet_interdigitized_c3_w3000_l150_nf1_rm2_met2_met3_d10"
        );

        let zero = InterdigitizedParams {
            numcols: 0,
            ..params
        };
        let err = zero.validate().unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidParams(_)));

        let wrapped = WrappedParams::builder().numcols(2).build().unwrap();
        assert!(wrapped.with_tie && wrapped.with_substrate_tap);
        assert_eq!(wrapped.core(FetKind::Pfet).kind, FetKind::Pfet);
    }
}
