//! Tiling of device variants into an alternating row.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use arcstr::ArcStr;
use subgeom::Point;

use super::InterdigitizedParams;
use crate::devices::fet::{multiplier, MultiplierParams};
use crate::error::{Error, ErrorSource, Result};
use crate::layout::cell::{Cell, CellBuilder, Instance};
use crate::layout::port::Port;
use crate::log::{debug, error};
use crate::pdk::layers::GLayer;
use crate::pdk::MappedPdk;

/// The structural variant of a placement.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceRole {
    /// The first placement. An A device that may carry a dummy on its left.
    DummyLeft,
    InteriorA,
    /// A B device with extended terminal routes.
    InteriorB,
    /// The last placement. A B device that may carry a dummy on its right.
    DummyRight,
}

impl DeviceRole {
    /// The role of placement `index` in a row of `count` placements.
    pub fn for_index(index: usize, count: usize) -> Self {
        if index == 0 {
            Self::DummyLeft
        } else if index + 1 == count {
            Self::DummyRight
        } else if index % 2 == 1 {
            Self::InteriorB
        } else {
            Self::InteriorA
        }
    }

    /// Returns `true` if the placement belongs to device A.
    pub fn is_a(&self) -> bool {
        matches!(self, Self::DummyLeft | Self::InteriorA)
    }

    /// The device letter, `A` or `B`.
    pub fn device(&self) -> &'static str {
        if self.is_a() {
            "A"
        } else {
            "B"
        }
    }
}

impl Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DummyLeft => "leftmost",
            Self::InteriorA => "interior A",
            Self::InteriorB => "interior B",
            Self::DummyRight => "rightmost",
        };
        write!(f, "{name}")
    }
}

/// A device placed in the row.
#[derive(Debug, Clone)]
pub struct Placement {
    index: usize,
    role: DeviceRole,
    dummy: bool,
    inst: Instance,
}

impl Placement {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Whether this placement carries a dummy on the row edge.
    #[inline]
    pub fn dummy(&self) -> bool {
        self.dummy
    }

    #[inline]
    pub fn inst(&self) -> &Instance {
        &self.inst
    }

    /// The prefix of this placement's ports in the assembled row, such as `A_0_`.
    pub fn prefix(&self) -> String {
        format!("{}_", self.inst.name())
    }

    /// Looks up a terminal of the placed device, in row coordinates.
    pub fn terminal(&self, name: &str) -> Result<Port> {
        self.inst.port(name).map_err(|_| {
            error!(
                "{} placement {} has no terminal {name}",
                self.role,
                self.inst.name()
            );
            Error::new(ErrorSource::MissingTerminal {
                placement: self.inst.name().clone(),
                terminal: name.into(),
            })
        })
    }
}

/// How much further device B's terminal routes sit from its diffusion than device A's.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TerminalExtension {
    pub sd: i64,
    pub gate: i64,
}

impl TerminalExtension {
    /// Computes the extensions that clear every route of `reference` by the
    /// largest metal separation of the process.
    pub fn from_reference(pdk: &dyn MappedPdk, reference: &Cell) -> Result<Self> {
        let max_sep = pdk.max_metal_separation()?;
        let dy = |a: &str, b: &str| -> Result<i64> {
            Ok((reference.port(a)?.center().y - reference.port(b)?.center().y).abs())
        };
        Ok(Self {
            sd: pdk.snap_to_2xgrid(max_sep + dy("drain_N", "diff_N")?),
            gate: pdk.snap_to_2xgrid(max_sep + dy("row0_col0_gate_S", "gate_S")?),
        })
    }
}

/// Device cells built during one row build, keyed by their parameters.
#[derive(Debug, Default)]
pub(crate) struct DeviceCache {
    cells: HashMap<MultiplierParams, Arc<Cell>>,
}

impl DeviceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached cell for `params`, building it on first use.
    pub(crate) fn get_or_build(
        &mut self,
        pdk: &dyn MappedPdk,
        params: &MultiplierParams,
    ) -> Result<Arc<Cell>> {
        match self.cells.entry(*params) {
            Entry::Occupied(o) => Ok(o.get().clone()),
            Entry::Vacant(v) => {
                let cell = Arc::new(multiplier(pdk, params)?);
                debug!("built device {}", cell.name());
                Ok(v.insert(cell).clone())
            }
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn clear(&mut self) {
        self.cells.clear();
    }
}

/// The four device variants of a row.
struct Variants {
    leftmost: Arc<Cell>,
    interior_a: Arc<Cell>,
    interior_b: Arc<Cell>,
    rightmost: Arc<Cell>,
}

/// Builds the placements of an interdigitized row.
pub struct RowBuilder<'a> {
    pdk: &'a dyn MappedPdk,
    params: &'a InterdigitizedParams,
    cache: DeviceCache,
}

impl<'a> RowBuilder<'a> {
    pub fn new(pdk: &'a dyn MappedPdk, params: &'a InterdigitizedParams) -> Self {
        Self {
            pdk,
            params,
            cache: DeviceCache::new(),
        }
    }

    fn variants(&mut self, extension: &mut TerminalExtension) -> Result<Variants> {
        let (left, right) = self.params.dummy.sides();
        let a = MultiplierParams::for_row(&self.params.shape, self.params.kind);

        let interior_a = self.cache.get_or_build(self.pdk, &a)?;
        *extension = TerminalExtension::from_reference(self.pdk, &interior_a)?;
        let b = a.with_extension(extension.sd, extension.gate);

        Ok(Variants {
            leftmost: self.cache.get_or_build(self.pdk, &a.with_dummy(left, false))?,
            interior_b: self.cache.get_or_build(self.pdk, &b)?,
            rightmost: self
                .cache
                .get_or_build(self.pdk, &b.with_dummy(false, right))?,
            interior_a,
        })
    }

    /// Places `2 * numcols` devices, alternating A and B.
    pub fn build(mut self) -> Result<RowAssembly> {
        self.params.validate()?;

        let mut extension = TerminalExtension::default();
        let variants = self.variants(&mut extension);
        debug!("row uses {} distinct device cells", self.cache.len());
        self.cache.clear();
        let variants = variants?;

        let diff_space = self.pdk.rule(GLayer::ActiveDiff)?.min_separation()?;
        let pitch = self
            .pdk
            .snap_to_2xgrid(variants.interior_a.bbox().width() + diff_space);

        let (left, right) = self.params.dummy.sides();
        let count = 2 * self.params.numcols;
        let placements = (0..count)
            .map(|index| {
                let role = DeviceRole::for_index(index, count);
                let (cell, dummy) = match role {
                    DeviceRole::DummyLeft => (&variants.leftmost, left),
                    DeviceRole::InteriorA => (&variants.interior_a, false),
                    DeviceRole::InteriorB => (&variants.interior_b, false),
                    DeviceRole::DummyRight => (&variants.rightmost, right),
                };
                Placement {
                    index,
                    role,
                    dummy,
                    inst: Instance::new(
                        format!("{}_{}", role.device(), index / 2),
                        cell.clone(),
                        Point::new(index as i64 * pitch, 0),
                    ),
                }
            })
            .collect();

        Ok(RowAssembly {
            placements,
            pitch,
            extension,
        })
    }
}

/// An ordered row of placed devices.
#[derive(Debug, Clone)]
pub struct RowAssembly {
    placements: Vec<Placement>,
    pitch: i64,
    extension: TerminalExtension,
}

impl RowAssembly {
    #[inline]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// The horizontal distance between adjacent placements.
    #[inline]
    pub fn pitch(&self) -> i64 {
        self.pitch
    }

    /// The extension applied to device B's routes.
    #[inline]
    pub fn extension(&self) -> TerminalExtension {
        self.extension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// The first and last placements.
    pub fn ends(&self) -> Result<(&Placement, &Placement)> {
        match (self.placements.first(), self.placements.last()) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(Error::new(ErrorSource::Internal(
                "row has no placements".to_string(),
            ))),
        }
    }

    /// Starts a cell holding every placement, with each placement's ports
    /// republished under its prefix.
    pub fn to_builder(&self, name: impl Into<ArcStr>) -> Result<CellBuilder> {
        let mut cell = Cell::builder(name);
        for placement in self.placements.iter() {
            cell.add_ports_with_prefix(placement.inst.ports(), &placement.prefix())?;
            cell.add_inst(placement.inst.clone());
        }
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fet::FetKind;
    use crate::interdigitized::DummySpec;
    use crate::tests::test_pdk;

    fn params(numcols: usize, dummy: impl Into<DummySpec>) -> InterdigitizedParams {
        InterdigitizedParams::builder()
            .numcols(numcols)
            .dummy(dummy)
            .build()
            .unwrap()
    }

    #[test]
    fn test_roles() {
        use DeviceRole::*;
        let roles: Vec<_> = (0..6).map(|i| DeviceRole::for_index(i, 6)).collect();
        assert_eq!(
            roles,
            [DummyLeft, InteriorB, InteriorA, InteriorB, InteriorA, DummyRight]
        );
        assert_eq!(DeviceRole::for_index(1, 2), DummyRight);
        assert!(DummyLeft.is_a());
        assert_eq!(DummyRight.device(), "B");
    }

    #[test]
    fn test_terminal_extension() {
        let pdk = test_pdk();
        let params = MultiplierParams::for_row(&Default::default(), FetKind::Nfet);
        let cell = multiplier(&pdk, &params).unwrap();
        // drain_N sits 800 nm above the diffusion and the gate route
        // 400 nm below the gate pads. The largest metal separation is 300 nm.
        let ext = TerminalExtension::from_reference(&pdk, &cell).unwrap();
        assert_eq!(ext, TerminalExtension { sd: 1100, gate: 700 });
    }

    #[test]
    fn test_device_cache_dedups() {
        let pdk = test_pdk();
        let mut cache = DeviceCache::new();
        let params = MultiplierParams::for_row(&Default::default(), FetKind::Nfet);
        let a = cache.get_or_build(&pdk, &params).unwrap();
        let b = cache.get_or_build(&pdk, &params).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        cache
            .get_or_build(&pdk, &params.with_dummy(true, false))
            .unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_row_placement() {
        let pdk = test_pdk();
        let params = params(3, (true, false));
        let row = RowBuilder::new(&pdk, &params).build().unwrap();
        assert_eq!(row.len(), 6);
        // The interior A device spans its implant, 125 nm past either end of
        // its 760 nm diffusion.
        assert_eq!(row.pitch(), 1010 + 270);
        assert_eq!(row.extension(), TerminalExtension { sd: 1100, gate: 700 });

        for (i, placement) in row.placements().iter().enumerate() {
            assert_eq!(placement.index(), i);
            assert_eq!(placement.inst().loc(), Point::new(i as i64 * row.pitch(), 0));
            assert_eq!(placement.role().is_a(), i % 2 == 0);
        }
        let (first, last) = row.ends().unwrap();
        assert!(first.dummy());
        assert!(!last.dummy());
        assert_eq!(first.prefix(), "A_0_");
        assert_eq!(last.prefix(), "B_2_");
        assert!(first.terminal("dummy_L_E").is_ok());
        assert!(last.terminal("dummy_R_W").is_err());

        let b = &row.placements()[1];
        assert_eq!(b.inst().cell().port("source_S").unwrap().center().y, 4240);
    }

    #[test]
    fn test_row_ports_are_prefixed() {
        let pdk = test_pdk();
        let params = params(1, true);
        let row = RowBuilder::new(&pdk, &params).build().unwrap();
        let cell = row.to_builder("row").unwrap().build();
        assert!(cell.port("A_0_source_W").is_ok());
        assert!(cell.port("B_0_drain_E").is_ok());
        assert!(cell.port("A_0_dummy_L_W").is_ok());
        assert!(cell.port("B_0_dummy_R_E").is_ok());
        assert_eq!(
            cell.port("B_0_diff_W").unwrap().center().x,
            row.pitch()
        );
    }

    #[test]
    fn test_missing_terminal() {
        let pdk = test_pdk();
        let params = params(1, false);
        let row = RowBuilder::new(&pdk, &params).build().unwrap();
        let err = row.placements()[0].terminal("bulk_W").unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::MissingTerminal { terminal, .. } if terminal == "bulk_W"
        ));
    }
}
