//! The SKY130 process, mapped onto the generic layers of [`interdigit`].

use std::path::Path;

use interdigit::error::{Error, ErrorSource, Result};
use interdigit::io::read_to_string;
use interdigit::pdk::layers::LayerMap;
use interdigit::pdk::rules::RuleDb;
use interdigit::pdk::MappedPdk;
use lazy_static::lazy_static;

const RULES: &str = include_str!("../data/rules.toml");
const LAYERS: &str = include_str!("../data/layers.csv");

lazy_static! {
    static ref BUNDLED: std::result::Result<Sky130MappedPdk, String> =
        Sky130MappedPdk::new().map_err(|err| err.to_string());
}

/// The bundled SKY130 process, parsed on first use and shared afterwards.
pub fn sky130() -> Result<&'static Sky130MappedPdk> {
    BUNDLED
        .as_ref()
        .map_err(|msg| Error::new(ErrorSource::Internal(msg.clone())))
}

pub struct Sky130MappedPdk {
    rules: RuleDb,
    layers: LayerMap,
}

impl Sky130MappedPdk {
    /// Loads the rule deck and layer map bundled with this crate.
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: RuleDb::from_toml(RULES)?,
            layers: LayerMap::from_csv(LAYERS)?,
        })
    }

    /// Loads a rule deck and layer map from disk, for use with a modified
    /// or updated process.
    pub fn from_files(rules: impl AsRef<Path>, layers: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            rules: RuleDb::from_toml(&read_to_string(rules)?)?,
            layers: LayerMap::from_csv(&read_to_string(layers)?)?,
        })
    }
}

impl MappedPdk for Sky130MappedPdk {
    fn name(&self) -> &str {
        "sky130"
    }

    fn rules(&self) -> &RuleDb {
        &self.rules
    }

    fn layers(&self) -> &LayerMap {
        &self.layers
    }
}
