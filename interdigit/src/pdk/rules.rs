//! Design rules keyed by layer or unordered layer pair.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;

use serde::Deserialize;
use thiserror::Error;

use super::layers::GLayer;

/// Identifies a rule: either a single layer or an unordered pair of layers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct RuleKey {
    first: GLayer,
    second: Option<GLayer>,
}

impl RuleKey {
    pub fn single(layer: GLayer) -> Self {
        Self {
            first: layer,
            second: None,
        }
    }

    /// Creates a key for a pair of layers. The order of `a` and `b` does not matter.
    pub fn pair(a: GLayer, b: GLayer) -> Self {
        if a == b {
            return Self::single(a);
        }
        Self {
            first: a.min(b),
            second: Some(a.max(b)),
        }
    }
}

impl Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.second {
            Some(second) => write!(f, "({}, {})", self.first, second),
            None => write!(f, "{}", self.first),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("no rule defined for {0}")]
    NotFound(RuleKey),
    #[error("rule for {key} does not define {field}")]
    MissingValue { key: RuleKey, field: &'static str },
    #[error("rule for {0} is defined more than once")]
    Duplicate(RuleKey),
    #[error("rules must name one or two layers, found {0}")]
    LayerCount(usize),
    #[error("layout grid must be positive, found {0}")]
    InvalidGrid(i64),
    #[error("error parsing rule deck: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Geometric constraints for one layer or layer pair, in nanometers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    key: RuleKey,
    min_width: Option<i64>,
    min_separation: Option<i64>,
    min_enclosure: Option<i64>,
}

impl Rule {
    #[inline]
    pub fn key(&self) -> RuleKey {
        self.key
    }

    pub fn min_width(&self) -> Result<i64, RuleError> {
        self.field(self.min_width, "min_width")
    }

    pub fn min_separation(&self) -> Result<i64, RuleError> {
        self.field(self.min_separation, "min_separation")
    }

    pub fn min_enclosure(&self) -> Result<i64, RuleError> {
        self.field(self.min_enclosure, "min_enclosure")
    }

    fn field(&self, value: Option<i64>, field: &'static str) -> Result<i64, RuleError> {
        value.ok_or(RuleError::MissingValue {
            key: self.key,
            field,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RuleRecord {
    layers: Vec<GLayer>,
    min_width: Option<i64>,
    min_separation: Option<i64>,
    min_enclosure: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RuleDeck {
    process: String,
    grid: i64,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleRecord>,
}

/// A rule deck for one process.
#[derive(Debug, Clone)]
pub struct RuleDb {
    process: String,
    grid: i64,
    rules: HashMap<RuleKey, Rule>,
}

impl RuleDb {
    /// Parses a rule deck from TOML.
    ///
    /// The deck names the process and its layout grid, followed by one
    /// `[[rule]]` table per layer or layer pair.
    pub fn from_toml(s: &str) -> Result<Self, RuleError> {
        let deck: RuleDeck = toml::from_str(s)?;
        if deck.grid <= 0 {
            return Err(RuleError::InvalidGrid(deck.grid));
        }

        let mut rules = HashMap::with_capacity(deck.rules.len());
        for record in deck.rules {
            let key = match record.layers.as_slice() {
                [a] => RuleKey::single(*a),
                [a, b] => RuleKey::pair(*a, *b),
                other => return Err(RuleError::LayerCount(other.len())),
            };
            let rule = Rule {
                key,
                min_width: record.min_width,
                min_separation: record.min_separation,
                min_enclosure: record.min_enclosure,
            };
            match rules.entry(key) {
                Entry::Occupied(_) => return Err(RuleError::Duplicate(key)),
                Entry::Vacant(v) => {
                    v.insert(rule);
                }
            }
        }

        Ok(Self {
            process: deck.process,
            grid: deck.grid,
            rules,
        })
    }

    #[inline]
    pub fn process(&self) -> &str {
        &self.process
    }

    #[inline]
    pub fn grid(&self) -> i64 {
        self.grid
    }

    pub fn get(&self, layer: GLayer) -> Result<&Rule, RuleError> {
        self.get_key(RuleKey::single(layer))
    }

    pub fn get_between(&self, a: GLayer, b: GLayer) -> Result<&Rule, RuleError> {
        self.get_key(RuleKey::pair(a, b))
    }

    fn get_key(&self, key: RuleKey) -> Result<&Rule, RuleError> {
        self.rules.get(&key).ok_or(RuleError::NotFound(key))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"
process = "toy"
grid = 5

[[rule]]
layers = ["met1"]
min_width = 140
min_separation = 140

[[rule]]
layers = ["via1", "met1"]
min_enclosure = 55
"#;

    #[test]
    fn test_pair_lookup_is_unordered() {
        let db = RuleDb::from_toml(DECK).unwrap();
        assert_eq!(db.process(), "toy");
        assert_eq!(db.grid(), 5);
        assert_eq!(db.len(), 2);
        let a = db.get_between(GLayer::Met1, GLayer::Via1).unwrap();
        let b = db.get_between(GLayer::Via1, GLayer::Met1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.min_enclosure().unwrap(), 55);
        assert_eq!(db.get_between(GLayer::Met1, GLayer::Met1).unwrap().min_width().unwrap(), 140);
    }

    #[test]
    fn test_missing_rules_and_values() {
        let db = RuleDb::from_toml(DECK).unwrap();
        assert!(matches!(
            db.get(GLayer::Met2),
            Err(RuleError::NotFound(_))
        ));
        let err = db.get(GLayer::Met1).unwrap().min_enclosure().unwrap_err();
        assert!(matches!(
            err,
            RuleError::MissingValue {
                field: "min_enclosure",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_decks() {
        let dup = format!("{DECK}\n[[rule]]\nlayers = [\"met1\", \"via1\"]\nmin_enclosure = 60\n");
        assert!(matches!(
            RuleDb::from_toml(&dup),
            Err(RuleError::Duplicate(_))
        ));

        let triple = "process = \"x\"\ngrid = 5\n[[rule]]\nlayers = [\"met1\", \"met2\", \"met3\"]\n";
        assert!(matches!(
            RuleDb::from_toml(triple),
            Err(RuleError::LayerCount(3))
        ));

        let grid = "process = \"x\"\ngrid = 0\n";
        assert!(matches!(
            RuleDb::from_toml(grid),
            Err(RuleError::InvalidGrid(0))
        ));

        assert!(matches!(
            RuleDb::from_toml("process = 5"),
            Err(RuleError::Toml(_))
        ));
    }
}
