//! Merging of like-named terminals into rails spanning the row.

use std::fmt::Display;
use std::sync::Arc;

use arcstr::ArcStr;
use subgeom::Point;

use super::row::RowAssembly;
use crate::error::Result;
use crate::layout::cell::{Cell, Instance};
use crate::layout::port::{rename_ports_by_list, rename_ports_by_orientation, Port};
use crate::layout::routing::straight_route;
use crate::log::debug;
use crate::pdk::MappedPdk;

/// A logical net merged across the row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RailClass {
    ASource,
    BSource,
    ADrain,
    BDrain,
    AGate,
    BGate,
}

impl RailClass {
    pub const ALL: [RailClass; 6] = [
        Self::ASource,
        Self::BSource,
        Self::ADrain,
        Self::BDrain,
        Self::AGate,
        Self::BGate,
    ];

    /// The prefix of the rail's ports in the merged cell.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::ASource => "A_source",
            Self::BSource => "B_source",
            Self::ADrain => "A_drain",
            Self::BDrain => "B_drain",
            Self::AGate => "A_gate",
            Self::BGate => "B_gate",
        }
    }

    /// The device terminal the rail connects.
    pub fn terminal(&self) -> &'static str {
        match self {
            Self::ASource | Self::BSource => "source",
            Self::ADrain | Self::BDrain => "drain",
            Self::AGate | Self::BGate => "gate",
        }
    }

    #[inline]
    pub fn is_a(&self) -> bool {
        matches!(self, Self::ASource | Self::ADrain | Self::AGate)
    }

    /// The (start, end) ports of the rail.
    ///
    /// A rails leave the first placement and run east; B rails leave the last
    /// placement and run west. Since a route stays on the track of the port
    /// it starts from, A rails follow the first placement's terminals and B
    /// rails follow the extended terminals of the last placement.
    pub fn endpoints(&self, row: &RowAssembly) -> Result<(Port, Port)> {
        let (first, last) = row.ends()?;
        let west = first.terminal(&format!("{}_W", self.terminal()))?;
        let east = last.terminal(&format!("{}_E", self.terminal()))?;
        Ok(if self.is_a() {
            (west, east)
        } else {
            (east, west)
        })
    }
}

impl Display for RailClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Draws the rails of a placed row.
pub struct RailMerger<'a> {
    pdk: &'a dyn MappedPdk,
}

impl<'a> RailMerger<'a> {
    pub fn new(pdk: &'a dyn MappedPdk) -> Self {
        Self { pdk }
    }

    /// Builds a cell holding the row, its merged implant, and one rail per
    /// [`RailClass`], centered on the origin.
    ///
    /// The implant route publishes no ports. Each rail publishes
    /// `{prefix}_N`, `{prefix}_E`, `{prefix}_S`, and `{prefix}_W`.
    pub fn merge(&self, row: &RowAssembly, name: impl Into<ArcStr>) -> Result<Cell> {
        let mut cell = row.to_builder(name)?;
        let (first, last) = row.ends()?;

        let implant = straight_route(
            self.pdk,
            &first.terminal("plusdoped_W")?,
            &last.terminal("plusdoped_E")?,
        )?;
        cell.add_inst(Instance::new(
            "plusdoped_route",
            Arc::new(implant),
            Point::zero(),
        ));

        for class in RailClass::ALL {
            let (from, to) = class.endpoints(row)?;
            let rail = straight_route(self.pdk, &from, &to)?;
            debug!(
                "{class} rail on {} at {}",
                from.layer(),
                from.center()
            );
            let ports = rename_ports_by_orientation(rename_ports_by_list(
                rail.ports().cloned(),
                &[("route_", "_")],
            ));
            cell.add_ports_with_prefix(ports, class.prefix())?;
            cell.add_inst(Instance::new(
                format!("{}_route", class.prefix()),
                Arc::new(rail),
                Point::zero(),
            ));
        }

        Ok(cell.build().centered(self.pdk.layout_grid()))
    }
}
