use std::fmt::{Debug, Display};
use std::path::PathBuf;

use arcstr::ArcStr;
use subgeom::ring::RingError;
use thiserror::Error;

use crate::layout::port::PortError;
use crate::pdk::rules::RuleError;

pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while generating a layout, along with what was being done at the time.
pub struct Error {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl Error {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    /// The tasks in progress when the error occurred, innermost first.
    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for Error
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl Error {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub(crate) fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorSource::InvalidParams(msg.into()))
    }

    pub(crate) fn infeasible(msg: impl Into<String>) -> Self {
        Self::new(ErrorSource::Infeasible(msg.into()))
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<Error>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    BuildDevice(ArcStr),
    BuildRow { numcols: usize },
    MergeRails,
    Wrap(ArcStr),
    CreateDir(PathBuf),
    CreateFile(PathBuf),
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            BuildDevice(name) => write!(f, "building device {name}"),
            BuildRow { numcols } => {
                write!(f, "building interdigitized row (numcols={numcols})")
            }
            MergeRails => write!(f, "merging terminal rails"),
            Wrap(name) => write!(f, "wrapping {name} with guard rings"),
            CreateDir(path) => write!(f, "creating directory {path:?}"),
            CreateFile(path) => write!(f, "creating file {path:?}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("infeasible geometry: {0}")]
    Infeasible(String),

    #[error("placement {placement} is missing expected terminal {terminal}")]
    MissingTerminal { placement: ArcStr, terminal: ArcStr },

    #[error("invalid layout (enable logging for details): {0}")]
    InvalidLayout(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("error accessing layout port: {0}")]
    Port(#[from] PortError),

    #[error("error looking up design rule: {0}")]
    Rule(#[from] RuleError),

    #[error("error drawing ring: {0}")]
    Ring(#[from] RingError),

    #[error("error parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("error writing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
