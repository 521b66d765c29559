//! Named, oriented connection points on a cell.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Bound;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use subgeom::transform::Translate;
use subgeom::{Dir, Point, Rect, Side, Span};
use thiserror::Error;

use crate::pdk::layers::GLayer;

/// The direction a port faces.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDir {
    N,
    E,
    S,
    W,
}

impl PortDir {
    pub const ALL: [PortDir; 4] = [PortDir::N, PortDir::E, PortDir::S, PortDir::W];

    /// The orientation angle in degrees, counter-clockwise from east.
    pub fn angle(&self) -> i64 {
        match self {
            Self::E => 0,
            Self::N => 90,
            Self::W => 180,
            Self::S => 270,
        }
    }

    /// The single-letter suffix used in port names.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::E => "E",
            Self::S => "S",
            Self::W => "W",
        }
    }

    /// The axis along which a route leaving this port travels.
    pub fn axis(&self) -> Dir {
        match self {
            Self::E | Self::W => Dir::Horiz,
            Self::N | Self::S => Dir::Vert,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Self::N => Side::Top,
            Self::E => Side::Right,
            Self::S => Side::Bot,
            Self::W => Side::Left,
        }
    }
}

impl From<Side> for PortDir {
    fn from(value: Side) -> Self {
        match value {
            Side::Top => Self::N,
            Side::Right => Self::E,
            Side::Bot => Self::S,
            Side::Left => Self::W,
        }
    }
}

impl Display for PortDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A port: a segment of a shape edge that other geometry may connect to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    name: ArcStr,
    center: Point,
    width: i64,
    orientation: PortDir,
    layer: GLayer,
}

impl Port {
    pub fn new(
        name: impl Into<ArcStr>,
        center: Point,
        width: i64,
        orientation: PortDir,
        layer: GLayer,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            width,
            orientation,
            layer,
        }
    }

    /// Creates the four edge ports of `rect`, named `{prefix}N`, `{prefix}E`,
    /// `{prefix}S`, and `{prefix}W`.
    pub fn edges(prefix: &str, rect: Rect, layer: GLayer) -> [Port; 4] {
        PortDir::ALL.map(|dir| {
            let side = dir.side();
            Port::new(
                format!("{prefix}{}", dir.suffix()),
                rect.edge_center(side),
                rect.span(side.edge_dir()).length(),
                dir,
                layer,
            )
        })
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.width
    }

    #[inline]
    pub fn orientation(&self) -> PortDir {
        self.orientation
    }

    #[inline]
    pub fn layer(&self) -> GLayer {
        self.layer
    }

    /// The span this port covers along its edge.
    pub fn span(&self) -> Span {
        let along = self.center.coord(!self.orientation.axis());
        Span::from_center_span(along, self.width)
    }

    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_prefix(self, prefix: &str) -> Self {
        let name = format!("{prefix}{}", self.name);
        self.with_name(name)
    }

    pub fn translated(mut self, p: Point) -> Self {
        self.center.translate(p);
        self
    }
}

/// How to resolve a port whose name is already taken.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum PortConflictStrategy {
    /// Overwrite the conflicting port, will never error.
    Overwrite,
    /// Return an error on conflicting ports.
    #[default]
    Error,
}

/// Ports keyed by name, iterated in name order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMap {
    ports: BTreeMap<ArcStr, Port>,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_port(&mut self, port: Port) -> Result<(), PortError> {
        self.add_port_with_strategy(port, PortConflictStrategy::default())
    }

    pub fn add_port_with_strategy(
        &mut self,
        port: Port,
        port_conflict_strategy: PortConflictStrategy,
    ) -> Result<(), PortError> {
        match self.ports.entry(port.name.clone()) {
            Entry::Occupied(mut o) => match port_conflict_strategy {
                PortConflictStrategy::Error => {
                    return Err(PortError::PortAlreadyExists(port.name));
                }
                PortConflictStrategy::Overwrite => {
                    use crate::log::warn;
                    warn!("overwriting existing port {}", port.name);
                    *o.get_mut() = port;
                }
            },
            Entry::Vacant(v) => {
                v.insert(port);
            }
        }
        Ok(())
    }

    pub fn add_ports(&mut self, ports: impl IntoIterator<Item = Port>) -> Result<(), PortError> {
        for port in ports.into_iter() {
            self.add_port(port)?
        }
        Ok(())
    }

    /// Retrieves a reference to the [`Port`] with name `name`.
    pub fn port(&self, name: &str) -> Result<&Port, PortError> {
        self.ports
            .get(name)
            .ok_or_else(|| PortError::PortNotFound(name.to_string()))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.ports.contains_key(name)
    }

    /// Returns an iterator over the ports, in name order.
    #[inline]
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Returns an iterator over the ports whose names start with `prefix`.
    pub fn ports_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Port> {
        self.ports
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(_, port)| port)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn translated(&self, p: Point) -> Self {
        self.ports.values().cloned().map(|port| port.translated(p)).collect()
    }
}

impl FromIterator<Port> for PortMap {
    /// Collects ports into a map. Later ports replace earlier ports of the same name.
    fn from_iter<T: IntoIterator<Item = Port>>(iter: T) -> Self {
        Self {
            ports: iter
                .into_iter()
                .map(|port| (port.name.clone(), port))
                .collect(),
        }
    }
}

impl IntoIterator for PortMap {
    type Item = Port;
    type IntoIter = std::collections::btree_map::IntoValues<ArcStr, Port>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.into_values()
    }
}

/// Renames ports by substring replacement.
///
/// Each port is renamed using the first `(from, to)` pair whose `from` occurs
/// in its name. Ports matching no pair keep their names.
pub fn rename_ports_by_list(
    ports: impl IntoIterator<Item = Port>,
    replacements: &[(&str, &str)],
) -> Vec<Port> {
    ports
        .into_iter()
        .map(|port| {
            match replacements
                .iter()
                .find(|(from, _)| port.name.contains(from))
            {
                Some((from, to)) => {
                    let name = port.name.replacen(from, to, 1);
                    port.with_name(name)
                }
                None => port,
            }
        })
        .collect()
}

/// Rewrites the trailing direction letter of each port name to match the port's orientation.
///
/// The segment after the last `_` is replaced by the orientation suffix. Names
/// without a `_` gain a `_{suffix}` ending.
pub fn rename_ports_by_orientation(ports: impl IntoIterator<Item = Port>) -> Vec<Port> {
    ports
        .into_iter()
        .map(|port| {
            let suffix = port.orientation.suffix();
            let name = match port.name.rfind('_') {
                Some(idx) => format!("{}_{suffix}", &port.name[..idx]),
                None => format!("{}_{suffix}", port.name),
            };
            port.with_name(name)
        })
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    /// The desired port was not found.
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// Port already exists.
    #[error("port already exists: {0}")]
    PortAlreadyExists(ArcStr),
}
