//! Process abstraction: generic layers, design rules, and grid snapping.

use subgeom::snap_to_grid;

use self::layers::{GLayer, GdsLayerSpec, LayerMap};
use self::rules::{Rule, RuleDb, RuleError};

pub mod layers;
pub mod rules;

/// A process design kit whose layers have been mapped to [`GLayer`]s.
///
/// Generators only ever talk to a process through this trait, so the same
/// generator runs unchanged on any process that provides a rule deck.
pub trait MappedPdk: Send + Sync {
    fn name(&self) -> &str;

    fn rules(&self) -> &RuleDb;

    fn layers(&self) -> &LayerMap;

    /// The layout grid, in nanometers.
    fn layout_grid(&self) -> i64 {
        self.rules().grid()
    }

    fn rule(&self, layer: GLayer) -> Result<&Rule, RuleError> {
        self.rules().get(layer)
    }

    fn rule_between(&self, a: GLayer, b: GLayer) -> Result<&Rule, RuleError> {
        self.rules().get_between(a, b)
    }

    fn snap_to_grid(&self, value: i64) -> i64 {
        snap_to_grid(value, self.layout_grid())
    }

    /// Snaps `value` to twice the layout grid, so that half of it is still on grid.
    fn snap_to_2xgrid(&self, value: i64) -> i64 {
        snap_to_grid(value, 2 * self.layout_grid())
    }

    /// Rounds `value` up to the next multiple of twice the layout grid.
    fn ceil_to_2xgrid(&self, value: i64) -> i64 {
        let grid = 2 * self.layout_grid();
        value.div_euclid(grid) * grid + if value.rem_euclid(grid) == 0 { 0 } else { grid }
    }

    /// The largest minimum separation among `met1` through `met5`.
    fn max_metal_separation(&self) -> Result<i64, RuleError> {
        GLayer::METALS
            .into_iter()
            .map(|metal| self.rule(metal)?.min_separation())
            .try_fold(0, |acc, sep| sep.map(|sep| acc.max(sep)))
    }

    fn gds_layer(&self, layer: GLayer) -> Option<GdsLayerSpec> {
        self.layers().get(layer)
    }
}
