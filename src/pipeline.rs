//! Ready-made stage chains for the common case: load a file, expand its templates and
//! includes, build its objects.

use std::path::Path;

use crate::composite::Composite;
use crate::construct::ConstructVisitor;
use crate::error::Error;
use crate::factory::Registry;
use crate::include::IncludeVisitor;
use crate::loader::{from_path_with_options, from_str_with_options};
use crate::node::Node;
use crate::options::Options;
use crate::template::{FileTokens, TemplateVisitor};
use crate::visitor::Visitor;

/// The stages [`resolve_path`] runs, short of construction: `{{ }}` tokens relative to
/// `path`, then document includes relative to `path`. Documents these stages load do
/// not call `options.budget_report`.
pub fn expansion_stages<'a>(path: &Path, options: &Options) -> Composite<'a> {
    let nested = options.nested();
    Composite::new()
        .then(TemplateVisitor::new(FileTokens::new(path, nested.clone())))
        .then(IncludeVisitor::new().relative_to(path).with_options(nested))
}

/// Loads `path`, expands it and builds every `class` spec with `registry`.
///
/// ```rust,no_run
/// use serde::Deserialize;
/// use saphyr_wire::{Options, Registry};
///
/// #[derive(Debug, Deserialize)]
/// struct Optimizer {
///     lr: f64,
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Optimizer>("optim.Sgd");
/// let tree = saphyr_wire::resolve_path("experiment.yml", &registry, &Options::default()).unwrap();
/// let optimizer = tree.get("optimizer").and_then(|n| n.downcast_ref::<Optimizer>());
/// ```
pub fn resolve_path(
    path: impl AsRef<Path>,
    registry: &Registry,
    options: &Options,
) -> Result<Node, Error> {
    let path = path.as_ref();
    let document = from_path_with_options(path, options)?;
    tracing::debug!(path = %path.display(), "resolving configuration");
    expansion_stages(path, options)
        .then(ConstructVisitor::new(registry))
        .visit(&document)
}

/// Loads `input`, includes documents named relative to the working directory and
/// builds every `class` spec with `registry`.
pub fn resolve_str(input: &str, registry: &Registry, options: &Options) -> Result<Node, Error> {
    let document = from_str_with_options(input, options)?;
    Composite::new()
        .then(IncludeVisitor::new().with_options(options.nested()))
        .then(ConstructVisitor::new(registry))
        .visit(&document)
}
