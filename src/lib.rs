//! Declarative object wiring for YAML configuration.
//!
//! A document is loaded into a [`Node`] tree and rewritten by a chain of [`Visitor`]
//! stages: `{{ }}` template tokens, document includes and finally construction of every
//! mapping that carries a `class` marker.
//!
//! ```rust
//! use saphyr_wire::{construct, from_str, Registry};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! let mut registry = Registry::new();
//! registry.register::<Point>("geo.Point");
//!
//! let tree = from_str("origin:\n  class: geo.Point\n  args: {x: 1, y: 2}\n").unwrap();
//! let built = construct(&registry, &tree).unwrap();
//! let origin = built.get("origin").and_then(|n| n.downcast_ref::<Point>()).unwrap();
//! assert_eq!((origin.x, origin.y), (1, 2));
//! ```

pub use budget::{check_yaml_budget, Budget};
pub use composite::Composite;
pub use construct::{construct, ConstructVisitor, ConstructionSpec};
pub use context::{
    visit_child, walk_mapping_in_context, walk_sequence_in_context, ContextVisitor, PathSegment,
    Tracked, VisitPath,
};
pub use de::from_node;
pub use debug::{PathTable, PrintVisitor};
pub use error::{Error, Location};
pub use factory::{Args, Built, Constructed, Factory, Generator, Instance, Registry, Repeat};
pub use include::IncludeVisitor;
pub use loader::{
    from_multiple, from_multiple_with_options, from_path, from_path_with_options, from_str,
    from_str_with_options,
};
pub use node::{Mapping, Node, NodeKind, Scalar};
pub use options::Options;
pub use pipeline::{expansion_stages, resolve_path, resolve_str};
pub use template::{
    load_with_templates, parse_token, EnvVar, FileTokens, RelativePath, TemplateVisitor,
    TokenResolver,
};
pub use visitor::{walk_mapping, walk_sequence, Identity, Visitor};

pub mod budget;
mod composite;
pub mod construct;
mod context;
mod de;
mod debug;
mod error;
mod factory;
pub mod include;
mod loader;
mod macros;
#[cfg(feature = "miette")]
pub mod miette;
mod node;
pub mod options;
mod parse_scalars;
mod pipeline;
mod tags;
pub mod template;
mod visitor;
