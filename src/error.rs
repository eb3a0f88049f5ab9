//! Defines error and its location
use std::fmt;
use std::path::PathBuf;

use saphyr_parser::{ScanError, Span};
use serde::de;

use crate::budget::BudgetBreach;
use crate::context::VisitPath;
use crate::node::NodeKind;

/// Row/column location within the source YAML document (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub(crate) row: u32,
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self { row: 0, column: 0 };

    pub(crate) const fn new(row: usize, column: usize) -> Self {
        // Error reporting only; documents beyond 4G lines are not a concern.
        Self {
            row: row as u32,
            column: column as u32,
        }
    }

    /// 1-indexed line.
    pub fn line(&self) -> u64 {
        self.row as u64
    }

    /// 1-indexed column.
    pub fn column(&self) -> u64 {
        self.column as u64
    }
}

/// Convert a `saphyr_parser::Span` to a 1-indexed `Location`.
pub(crate) fn location_from_span(span: &Span) -> Location {
    let start = &span.start;
    Location::new(start.line(), start.col() + 1)
}

/// Everything that can go wrong while loading, visiting or constructing.
///
/// Document errors carry a [`Location`]; traversal errors carry the visit path of the
/// node that failed (empty when raised outside a path-tracking visitor).
#[derive(Debug)]
pub enum Error {
    /// Free-form error with optional source location.
    Message { msg: String, location: Location },
    /// Alias references a non-existent anchor id.
    UnknownAnchor { id: usize, location: Location },
    /// A YAML budget limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// A mapping repeats a key and the duplicate policy is `Error`.
    DuplicateKey { key: String, location: Location },
    /// `from_str` found a second document.
    MultipleDocuments { location: Location },
    /// A `class` marker names nothing in the registry.
    Resolution { class: String, path: String },
    /// The constructor for `class` rejected its arguments or failed.
    Construction {
        class: String,
        msg: String,
        path: String,
    },
    /// Held and supplied factory arguments have shapes that cannot be merged.
    ArgumentMerge {
        class: String,
        held: NodeKind,
        supplied: NodeKind,
        path: String,
    },
    /// A template token could not be resolved.
    Token { token: String, msg: String },
    /// Reading a file (or writing diagnostics) failed.
    Io {
        path: Option<PathBuf>,
        cause: std::io::Error,
    },
    /// An included document failed to parse.
    Document { path: PathBuf, cause: Box<Error> },
}

impl Error {
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn resolution(class: &str) -> Self {
        Error::Resolution {
            class: class.to_owned(),
            path: String::new(),
        }
    }

    /// A construction failure for use inside constructor closures. The class and path
    /// are filled in by the factory and the construction visitor.
    pub fn construction_msg<S: Into<String>>(msg: S) -> Self {
        Error::Construction {
            class: String::new(),
            msg: msg.into(),
            path: String::new(),
        }
    }

    pub(crate) fn token<S: Into<String>>(token: &str, msg: S) -> Self {
        Error::Token {
            token: token.to_owned(),
            msg: msg.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        Error::Io {
            path: Some(path.into()),
            cause,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Message { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::Budget { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::MultipleDocuments { location } => {
                *location = set_location;
            }
            _ => {}
        }
        self
    }

    /// Records `path` unless a deeper path was recorded already.
    pub(crate) fn with_path(mut self, visit_path: &VisitPath) -> Self {
        match &mut self {
            Error::Resolution { path, .. }
            | Error::Construction { path, .. }
            | Error::ArgumentMerge { path, .. }
                if path.is_empty() =>
            {
                *path = visit_path.to_string();
            }
            _ => {}
        }
        self
    }

    /// Wraps a constructor failure so it names `class`. Construction errors raised with
    /// [`Error::construction_msg`] keep their message; anything else becomes one.
    pub(crate) fn in_class(self, class: &str) -> Self {
        match self {
            Error::Construction { class: c, msg, path } => Error::Construction {
                class: if c.is_empty() { class.to_owned() } else { c },
                msg,
                path,
            },
            err @ (Error::Resolution { .. } | Error::ArgumentMerge { .. }) => err,
            other => Error::Construction {
                class: class.to_owned(),
                msg: other.to_string(),
                path: String::new(),
            },
        }
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Message { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::Budget { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::MultipleDocuments { location } => {
                (*location != Location::UNKNOWN).then_some(*location)
            }
            Error::Document { cause, .. } => cause.location(),
            _ => None,
        }
    }

    /// The visit path of the failing node, if one was recorded.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::Resolution { path, .. }
            | Error::Construction { path, .. }
            | Error::ArgumentMerge { path, .. } => (!path.is_empty()).then_some(path.as_str()),
            _ => None,
        }
    }

    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        let location = Location::new(mark.line(), mark.col() + 1);
        Error::Message {
            msg: err.info().to_owned(),
            location,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Message { msg, location } => fmt_with_location(f, msg, location),
            Error::UnknownAnchor { id, location } => {
                fmt_with_location(f, &format!("alias references unknown anchor id {id}"), location)
            }
            Error::Budget { breach, location } => {
                fmt_with_location(f, &format!("YAML budget breached: {breach:?}"), location)
            }
            Error::DuplicateKey { key, location } => {
                fmt_with_location(f, &format!("duplicate mapping key `{key}`"), location)
            }
            Error::MultipleDocuments { location } => fmt_with_location(
                f,
                "multiple YAML documents detected; use from_multiple or from_multiple_with_options",
                location,
            ),
            Error::Resolution { class, path } => {
                fmt_with_path(f, &format!("cannot resolve class `{class}`"), path)
            }
            Error::Construction { class, msg, path } => {
                fmt_with_path(f, &format!("failed to construct `{class}`: {msg}"), path)
            }
            Error::ArgumentMerge {
                class,
                held,
                supplied,
                path,
            } => fmt_with_path(
                f,
                &format!("cannot merge {supplied} arguments into held {held} arguments of `{class}`"),
                path,
            ),
            Error::Token { token, msg } => write!(f, "cannot resolve template token `{token}`: {msg}"),
            Error::Io {
                path: Some(path),
                cause,
            } => write!(f, "IO error on {}: {cause}", path.display()),
            Error::Io { path: None, cause } => write!(f, "IO error: {cause}"),
            Error::Document { path, cause } => write!(f, "{}: {cause}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { cause, .. } => Some(cause),
            Error::Document { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location != &Location::UNKNOWN {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.row, location.column
        )
    } else {
        write!(f, "{msg}")
    }
}

fn fmt_with_path(f: &mut fmt::Formatter<'_>, msg: &str, path: &str) -> fmt::Result {
    if path.is_empty() {
        write!(f, "{msg}")
    } else {
        write!(f, "{msg} at `{path}`")
    }
}

/// Convert a budget breach report into a user-facing error.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}
