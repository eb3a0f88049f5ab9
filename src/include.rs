//! Replaces document paths with the documents they name.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::loader::from_path_with_options;
use crate::node::{Node, Scalar};
use crate::options::Options;
use crate::visitor::Visitor;

/// Extensions recognised as includable documents.
pub const DOCUMENT_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Swaps a string scalar that names an existing `.yml`/`.yaml` file for the parsed
/// contents of that file. Any other scalar passes through.
///
/// Relative paths are resolved against the directory of the base file, when one is
/// set, and against the working directory otherwise. The included tree is inserted as
/// parsed; it is not visited again.
#[derive(Clone, Debug, Default)]
pub struct IncludeVisitor {
    options: Options,
    base_dir: Option<PathBuf>,
}

impl IncludeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths next to `file`.
    pub fn relative_to(mut self, file: impl AsRef<Path>) -> Self {
        self.base_dir = file.as_ref().parent().map(Path::to_path_buf);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    fn candidate(&self, text: &str) -> Option<PathBuf> {
        let path = Path::new(text);
        let extension = path.extension()?.to_str()?;
        if !DOCUMENT_EXTENSIONS.contains(&extension) {
            return None;
        }
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        resolved.is_file().then_some(resolved)
    }
}

impl Visitor for IncludeVisitor {
    fn visit_scalar(&mut self, scalar: &Scalar) -> Result<Node, Error> {
        let Some(path) = scalar.as_str().and_then(|text| self.candidate(text)) else {
            return Ok(Node::Scalar(scalar.clone()));
        };
        tracing::debug!(path = %path.display(), "including document");
        from_path_with_options(&path, &self.options)
    }
}
