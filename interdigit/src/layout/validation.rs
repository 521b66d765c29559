use std::fmt::Display;

use arcstr::ArcStr;
use subgeom::{Point, ShapeTrait};

use super::cell::Cell;
use crate::log::Log;
use crate::pdk::layers::GLayer;

/// Validates a layout cell against the layout grid.
///
/// The cell hierarchy is flattened first, so geometry inside instances is
/// checked at its final position.
pub fn validate_cell(cell: &Cell, grid: i64) -> ValidationReport {
    LayoutValidator { cell, grid }.validate()
}

pub struct LayoutValidator<'a> {
    cell: &'a Cell,
    grid: i64,
}

/// The problems found in one cell.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    cell_name: ArcStr,
    elements: usize,
    ports: usize,
    errors: Vec<Error>,
}

impl ValidationReport {
    /// Logs a summary at debug level and every error at error level.
    pub fn log(&self) {
        use crate::log::debug;
        debug!(
            "validated {}: {} elements, {} ports, {} errors",
            self.cell_name,
            self.elements,
            self.ports,
            self.errors.len()
        );
        for error in self.errors.iter() {
            error.log();
        }
    }

    /// Returns `true` if any errors were encountered.
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[inline]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Returns the first encountered error as a [`String`], if any.
    pub fn first_error(&self) -> Option<String> {
        self.errors.first().map(|err| format!("{err}"))
    }
}

/// An error location.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Location {
    /// The `index`-th flattened element, drawn on `layer`.
    Element {
        cell_name: ArcStr,
        index: usize,
        layer: GLayer,
        point: Point,
    },
    Port { cell_name: ArcStr, port: ArcStr },
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Element {
                cell_name,
                index,
                layer,
                point,
            } => write!(
                f,
                "cell {cell_name}, element {index} on {layer} near {point}"
            ),
            Location::Port { cell_name, port } => write!(f, "cell {cell_name}, port {port}"),
        }
    }
}

/// Data for an error.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Error {
    loc: Location,
    cause: ErrorCause,
}

impl Log for Error {
    fn log(&self) {
        use crate::log::error;
        error!("{self}");
    }
}

/// An enumeration of causes for an error.
#[non_exhaustive]
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCause {
    /// A shape vertex is off the layout grid.
    OffGrid,
    /// A rectangle with no area.
    EmptyShape,
    /// A port with no width.
    ZeroWidthPort,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cause {
            ErrorCause::OffGrid => write!(f, "geometry is off grid: {}", self.loc),
            ErrorCause::EmptyShape => write!(f, "shape has zero area: {}", self.loc),
            ErrorCause::ZeroWidthPort => write!(f, "port has zero width: {}", self.loc),
        }
    }
}

impl Error {
    /// Creates a new [`Error`].
    pub fn new(loc: Location, cause: ErrorCause) -> Self {
        Self { loc, cause }
    }

    #[inline]
    pub fn cause(&self) -> &ErrorCause {
        &self.cause
    }

    #[inline]
    pub fn loc(&self) -> &Location {
        &self.loc
    }
}

impl<'a> LayoutValidator<'a> {
    fn validate(&self) -> ValidationReport {
        let mut output = ValidationReport {
            cell_name: self.cell.name().clone(),
            ..Default::default()
        };
        self.validate_elements(&mut output);
        self.validate_ports(&mut output);
        output
    }

    /// Checks that every flattened shape is on grid and has positive area.
    fn validate_elements(&self, output: &mut ValidationReport) {
        let elems = self.cell.flat_elems();
        output.elements = elems.len();
        for (index, elem) in elems.into_iter().enumerate() {
            let loc = || Location::Element {
                cell_name: self.cell.name().clone(),
                index,
                layer: elem.layer,
                point: elem.inner.point0(),
            };
            if !elem.inner.is_on_grid(self.grid) {
                output.errors.push(Error::new(loc(), ErrorCause::OffGrid));
            }
            if elem
                .inner
                .rects()
                .iter()
                .any(|r| r.width() <= 0 || r.height() <= 0)
            {
                output.errors.push(Error::new(loc(), ErrorCause::EmptyShape));
            }
        }
    }

    /// Checks that every top-level port has positive width.
    ///
    /// Port centers may fall halfway between grid points.
    fn validate_ports(&self, output: &mut ValidationReport) {
        output.ports = self.cell.port_map().len();
        for port in self.cell.ports().filter(|port| port.width() <= 0) {
            output.errors.push(Error::new(
                Location::Port {
                    cell_name: self.cell.name().clone(),
                    port: port.name().clone(),
                },
                ErrorCause::ZeroWidthPort,
            ));
        }
    }
}
