//! Generic layers and their mapping to process GDS layers.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A process-independent layer name.
///
/// Generators draw on generic layers. A [`LayerMap`] translates them to the
/// GDS layers of a specific process.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum GLayer {
    #[serde(rename = "dnwell")]
    Dnwell,
    #[serde(rename = "pwell")]
    Pwell,
    #[serde(rename = "nwell")]
    Nwell,
    #[serde(rename = "p+s/d")]
    PPlus,
    #[serde(rename = "n+s/d")]
    NPlus,
    #[serde(rename = "active_diff")]
    ActiveDiff,
    #[serde(rename = "active_tap")]
    ActiveTap,
    #[serde(rename = "poly")]
    Poly,
    #[serde(rename = "mcon")]
    Mcon,
    #[serde(rename = "met1")]
    Met1,
    #[serde(rename = "via1")]
    Via1,
    #[serde(rename = "met2")]
    Met2,
    #[serde(rename = "via2")]
    Via2,
    #[serde(rename = "met3")]
    Met3,
    #[serde(rename = "via3")]
    Via3,
    #[serde(rename = "met4")]
    Met4,
    #[serde(rename = "via4")]
    Via4,
    #[serde(rename = "met5")]
    Met5,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown generic layer `{0}`")]
pub struct GLayerParseError(String);

impl GLayer {
    pub const ALL: [GLayer; 18] = [
        GLayer::Dnwell,
        GLayer::Pwell,
        GLayer::Nwell,
        GLayer::PPlus,
        GLayer::NPlus,
        GLayer::ActiveDiff,
        GLayer::ActiveTap,
        GLayer::Poly,
        GLayer::Mcon,
        GLayer::Met1,
        GLayer::Via1,
        GLayer::Met2,
        GLayer::Via2,
        GLayer::Met3,
        GLayer::Via3,
        GLayer::Met4,
        GLayer::Via4,
        GLayer::Met5,
    ];

    pub const METALS: [GLayer; 5] = [
        GLayer::Met1,
        GLayer::Met2,
        GLayer::Met3,
        GLayer::Met4,
        GLayer::Met5,
    ];

    pub fn as_str(&self) -> &'static str {
        use GLayer::*;
        match self {
            Dnwell => "dnwell",
            Pwell => "pwell",
            Nwell => "nwell",
            PPlus => "p+s/d",
            NPlus => "n+s/d",
            ActiveDiff => "active_diff",
            ActiveTap => "active_tap",
            Poly => "poly",
            Mcon => "mcon",
            Met1 => "met1",
            Via1 => "via1",
            Met2 => "met2",
            Via2 => "via2",
            Met3 => "met3",
            Via3 => "via3",
            Met4 => "met4",
            Via4 => "via4",
            Met5 => "met5",
        }
    }

    /// The metal at routing level `idx`, where `met1` is level 1.
    pub fn metal(idx: usize) -> Option<GLayer> {
        idx.checked_sub(1)
            .and_then(|i| Self::METALS.get(i).copied())
    }

    /// The routing level of a conducting layer.
    ///
    /// Poly and the active layers are level 0, since they connect upward to
    /// `met1` through `mcon`. Layers that cannot carry a route have no level.
    pub fn level(&self) -> Option<usize> {
        use GLayer::*;
        match self {
            Poly | ActiveDiff | ActiveTap => Some(0),
            Met1 => Some(1),
            Met2 => Some(2),
            Met3 => Some(3),
            Met4 => Some(4),
            Met5 => Some(5),
            _ => None,
        }
    }

    /// The cut layer joining routing level `level` to level `level + 1`.
    pub fn via_above(level: usize) -> Option<GLayer> {
        use GLayer::*;
        match level {
            0 => Some(Mcon),
            1 => Some(Via1),
            2 => Some(Via2),
            3 => Some(Via3),
            4 => Some(Via4),
            _ => None,
        }
    }

    #[inline]
    pub fn is_metal(&self) -> bool {
        matches!(self.level(), Some(l) if l >= 1)
    }
}

impl Display for GLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GLayer {
    type Err = GLayerParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str() == name)
            .ok_or_else(|| GLayerParseError(s.to_string()))
    }
}

/// A GDS layer number and datatype.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsLayerSpec(pub i16, pub i16);

#[derive(Debug, Clone, Deserialize)]
struct CsvLayerRecord {
    glayer: GLayer,
    layernum: i16,
    datatype: i16,
}

/// Maps generic layers to process GDS layers.
#[derive(Debug, Default, Clone)]
pub struct LayerMap {
    layers: HashMap<GLayer, GdsLayerSpec>,
}

impl LayerMap {
    /// Parses a layer map from CSV with columns `glayer,layernum,datatype`.
    pub fn from_csv(csv: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let mut layers = HashMap::new();
        for record in reader.deserialize() {
            let record: CsvLayerRecord = record?;
            layers.insert(
                record.glayer,
                GdsLayerSpec(record.layernum, record.datatype),
            );
        }
        Ok(Self { layers })
    }

    pub fn get(&self, layer: GLayer) -> Option<GdsLayerSpec> {
        self.layers.get(&layer).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glayer_names_round_trip() {
        for layer in GLayer::ALL {
            assert_eq!(layer.as_str().parse::<GLayer>().unwrap(), layer);
        }
        assert!("met6".parse::<GLayer>().is_err());
    }

    #[test]
    fn test_levels_and_vias() {
        assert_eq!(GLayer::metal(1), Some(GLayer::Met1));
        assert_eq!(GLayer::metal(0), None);
        assert_eq!(GLayer::metal(6), None);
        assert_eq!(GLayer::Poly.level(), Some(0));
        assert_eq!(GLayer::Met3.level(), Some(3));
        assert_eq!(GLayer::Pwell.level(), None);
        assert_eq!(GLayer::via_above(0), Some(GLayer::Mcon));
        assert_eq!(GLayer::via_above(2), Some(GLayer::Via2));
        assert!(GLayer::Met2.is_metal());
        assert!(!GLayer::ActiveTap.is_metal());
    }

    #[test]
    fn test_layer_map_from_csv() {
        let csv = "glayer,layernum,datatype\nmet1,68,20\np+s/d,94,20\n";
        let map = LayerMap::from_csv(csv).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(GLayer::Met1), Some(GdsLayerSpec(68, 20)));
        assert_eq!(map.get(GLayer::PPlus), Some(GdsLayerSpec(94, 20)));
        assert_eq!(map.get(GLayer::Met2), None);
    }
}
