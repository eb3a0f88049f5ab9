//! YAML text to [`Node`] trees, built from `saphyr-parser` events.
//!
//! The loader is a small state machine over the event stream. Every event is checked
//! against the [`Budget`](crate::Budget) first. Containers under construction live on
//! an explicit stack, so document depth never turns into native recursion.
//!
//! - Plain scalars are typed by the YAML 1.2 core schema (see [`Options`] for the
//!   YAML 1.1 switches). Quoted scalars are strings. Core tags (`!!int`, `!!str`, ...)
//!   force a type; other tags are ignored.
//! - Aliases copy the anchored node. [`AliasLimits`](crate::options::AliasLimits)
//!   bound how much copying a document may ask for.
//! - `<<` merge keys pull entries from a mapping or a list of mappings. Keys written
//!   in the mapping itself win, then earlier merge sources over later ones.
//! - Keys must be scalars and are kept as written in the source.
//! - `from_str*` accepts one document; `from_multiple*` returns every non-empty one.

use std::path::Path;

use ahash::AHashMap;
use indexmap::map::Entry;
use saphyr_parser::{Event, Parser, ScalarStyle};

use crate::budget::{BudgetBreach, BudgetEnforcer};
use crate::error::{budget_error, location_from_span, Error, Location};
use crate::node::{Mapping, Node, Scalar};
use crate::options::{DuplicateKeyPolicy, Options};
use crate::parse_scalars::{resolve_plain, resolve_tagged};
use crate::tags::CoreTag;

const MERGE_KEY: &str = "<<";

/// Loads a single document with default [`Options`].
///
/// ```rust
/// let node = saphyr_wire::from_str("name: encoder\nlayers: [64, 32]\n").unwrap();
/// assert_eq!(node.get("name").and_then(|n| n.as_str()), Some("encoder"));
/// assert_eq!(node.to_string(), "{name: encoder, layers: [64, 32]}");
/// ```
pub fn from_str(input: &str) -> Result<Node, Error> {
    from_str_with_options(input, &Options::default())
}

/// Loads a single document. An empty input is `null`; a second non-empty document is
/// [`Error::MultipleDocuments`].
pub fn from_str_with_options(input: &str, options: &Options) -> Result<Node, Error> {
    let mut documents = load(input, options)?.into_iter();
    let Some(first) = documents.next() else {
        return Ok(Node::NULL);
    };
    if let Some(extra) = documents.find(|doc| !doc.empty) {
        return Err(Error::MultipleDocuments {
            location: extra.location,
        });
    }
    Ok(first.root)
}

/// Loads every document in a `---` separated stream.
///
/// ```rust
/// let docs = saphyr_wire::from_multiple("a: 1\n---\nb: 2\n").unwrap();
/// assert_eq!(docs.len(), 2);
/// ```
pub fn from_multiple(input: &str) -> Result<Vec<Node>, Error> {
    from_multiple_with_options(input, &Options::default())
}

/// Loads every non-empty document in the stream.
pub fn from_multiple_with_options(input: &str, options: &Options) -> Result<Vec<Node>, Error> {
    Ok(load(input, options)?
        .into_iter()
        .filter(|doc| !doc.empty)
        .map(|doc| doc.root)
        .collect())
}

pub fn from_path(path: impl AsRef<Path>) -> Result<Node, Error> {
    from_path_with_options(path, &Options::default())
}

/// Reads and loads the single document in `path`.
///
/// Read failures are [`Error::Io`]; anything wrong with the content is
/// [`Error::Document`] naming the file.
pub fn from_path_with_options(path: impl AsRef<Path>, options: &Options) -> Result<Node, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|cause| Error::io(path, cause))?;
    from_str_with_options(&text, options).map_err(|cause| Error::Document {
        path: path.to_path_buf(),
        cause: Box::new(cause),
    })
}

struct Document {
    root: Node,
    location: Location,
    /// Nothing but an untagged empty plain scalar.
    empty: bool,
}

struct Anchored {
    node: Node,
    size: usize,
    expansions: usize,
}

struct PendingKey {
    text: String,
    merge: bool,
    location: Location,
}

enum Frame {
    Sequence {
        anchor: usize,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        map: Mapping,
        key: Option<PendingKey>,
        merges: Vec<Node>,
    },
}

struct Loader<'o> {
    options: &'o Options,
    enforcer: Option<BudgetEnforcer>,
    anchors: AHashMap<usize, Anchored>,
    replayed: usize,
    stack: Vec<Frame>,
    documents: Vec<Document>,
    document_start: Location,
    empty_root: bool,
}

fn load(input: &str, options: &Options) -> Result<Vec<Document>, Error> {
    let mut loader = Loader {
        options,
        enforcer: options.budget.clone().map(BudgetEnforcer::new),
        anchors: AHashMap::new(),
        replayed: 0,
        stack: Vec::new(),
        documents: Vec::new(),
        document_start: Location::UNKNOWN,
        empty_root: false,
    };
    for item in Parser::new_from_str(input) {
        let (event, span) = item.map_err(Error::from_scan_error)?;
        let location = location_from_span(&span);
        // The parser reports an absent node as a zero-width plain scalar.
        let zero_width = span.start.index() == span.end.index();
        loader.check_budget(&event, location)?;
        loader.event(event, location, zero_width)?;
    }
    loader.finish()
}

impl Loader<'_> {
    fn check_budget(&mut self, event: &Event, location: Location) -> Result<(), Error> {
        let Some(enforcer) = self.enforcer.as_mut() else {
            return Ok(());
        };
        let observed = enforcer.observe(event);
        observed.map_err(|breach| self.breach(breach, location))
    }

    fn count_merge_key(&mut self, location: Location) -> Result<(), Error> {
        let Some(enforcer) = self.enforcer.as_mut() else {
            return Ok(());
        };
        let observed = enforcer.observe_merge_key();
        observed.map_err(|breach| self.breach(breach, location))
    }

    /// Reports the breach and turns it into an error. The enforcer is spent.
    fn breach(&mut self, breach: BudgetBreach, location: Location) -> Error {
        if let (Some(enforcer), Some(callback)) = (self.enforcer.take(), self.options.budget_report) {
            callback(&enforcer.into_breached(breach.clone()));
        }
        tracing::debug!(?breach, line = location.line(), "document exceeds budget");
        budget_error(breach).with_location(location)
    }

    fn finish(mut self) -> Result<Vec<Document>, Error> {
        if let Some(enforcer) = self.enforcer.take() {
            let report = enforcer.finalize();
            if let Some(callback) = self.options.budget_report {
                callback(&report);
            }
            if let Some(breach) = report.breached {
                return Err(budget_error(breach));
            }
        }
        Ok(self.documents)
    }

    fn event(&mut self, event: Event<'_>, location: Location, zero_width: bool) -> Result<(), Error> {
        match event {
            Event::DocumentStart(_) => {
                self.document_start = location;
                self.anchors.clear();
                Ok(())
            }
            Event::Scalar(value, style, anchor, tag) => {
                let tag = tag.map(|tag| tag.to_string());
                if self.expecting_key() {
                    return self.scalar_key(value.into_owned(), style, tag, anchor, location);
                }
                if self.stack.is_empty() {
                    self.empty_root = zero_width
                        && tag.is_none()
                        && anchor == 0
                        && matches!(style, ScalarStyle::Plain);
                }
                let core = tag.as_deref().and_then(CoreTag::classify);
                let scalar = match core {
                    Some(core) => resolve_tagged(&value, core, self.options, location)?,
                    None if matches!(style, ScalarStyle::Plain) => resolve_plain(&value, self.options),
                    None => Scalar::String(value.into_owned()),
                };
                self.complete(Node::Scalar(scalar), anchor, location)
            }
            Event::SequenceStart(anchor, _) => {
                self.reject_complex_key(location)?;
                self.stack.push(Frame::Sequence {
                    anchor,
                    items: Vec::new(),
                });
                Ok(())
            }
            Event::MappingStart(anchor, _) => {
                self.reject_complex_key(location)?;
                self.stack.push(Frame::Mapping {
                    anchor,
                    map: Mapping::new(),
                    key: None,
                    merges: Vec::new(),
                });
                Ok(())
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence { anchor, items }) => {
                    self.complete(Node::Sequence(items), anchor, location)
                }
                _ => Err(Error::msg("unbalanced sequence end").with_location(location)),
            },
            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    anchor,
                    mut map,
                    merges,
                    ..
                }) => {
                    apply_merges(&mut map, merges);
                    self.complete(Node::Mapping(map), anchor, location)
                }
                _ => Err(Error::msg("unbalanced mapping end").with_location(location)),
            },
            Event::Alias(id) => {
                let node = self.expand_alias(id, location)?;
                if self.expecting_key() {
                    return match node {
                        Node::Scalar(scalar) => {
                            self.set_key(scalar.to_string(), false, location);
                            Ok(())
                        }
                        _ => Err(complex_key(location)),
                    };
                }
                self.complete(node, 0, location)
            }
            Event::StreamStart | Event::StreamEnd | Event::DocumentEnd | Event::Nothing => Ok(()),
        }
    }

    fn expecting_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn reject_complex_key(&self, location: Location) -> Result<(), Error> {
        if self.expecting_key() {
            Err(complex_key(location))
        } else {
            Ok(())
        }
    }

    fn scalar_key(
        &mut self,
        text: String,
        style: ScalarStyle,
        tag: Option<String>,
        anchor: usize,
        location: Location,
    ) -> Result<(), Error> {
        let merge = self.options.merge_keys
            && tag.is_none()
            && matches!(style, ScalarStyle::Plain)
            && text == MERGE_KEY;
        if merge {
            self.count_merge_key(location)?;
        }
        if anchor != 0 {
            self.remember(anchor, Node::from(text.clone()));
        }
        self.set_key(text, merge, location);
        Ok(())
    }

    fn set_key(&mut self, text: String, merge: bool, location: Location) {
        if let Some(Frame::Mapping { key, .. }) = self.stack.last_mut() {
            *key = Some(PendingKey {
                text,
                merge,
                location,
            });
        }
    }

    fn remember(&mut self, anchor: usize, node: Node) {
        let size = node.node_count();
        self.anchors.insert(
            anchor,
            Anchored {
                node,
                size,
                expansions: 0,
            },
        );
    }

    fn expand_alias(&mut self, id: usize, location: Location) -> Result<Node, Error> {
        let limits = self.options.alias_limits;
        let anchored = self
            .anchors
            .get_mut(&id)
            .ok_or(Error::UnknownAnchor { id, location })?;
        anchored.expansions += 1;
        if anchored.expansions > limits.max_alias_expansions_per_anchor {
            return Err(Error::msg(format!(
                "anchor expanded more than {} times",
                limits.max_alias_expansions_per_anchor
            ))
            .with_location(location));
        }
        self.replayed = self.replayed.saturating_add(anchored.size);
        if self.replayed > limits.max_total_replayed_nodes {
            return Err(Error::msg(format!(
                "aliases copy more than {} nodes",
                limits.max_total_replayed_nodes
            ))
            .with_location(location));
        }
        Ok(anchored.node.clone())
    }

    /// Places a finished node into its parent, or makes it a document root.
    fn complete(&mut self, node: Node, anchor: usize, location: Location) -> Result<(), Error> {
        if anchor != 0 {
            self.remember(anchor, node.clone());
        }
        match self.stack.last_mut() {
            None => {
                self.documents.push(Document {
                    root: node,
                    location: self.document_start,
                    empty: std::mem::take(&mut self.empty_root),
                });
                Ok(())
            }
            Some(Frame::Sequence { items, .. }) => {
                items.push(node);
                Ok(())
            }
            Some(Frame::Mapping {
                map, key, merges, ..
            }) => {
                let Some(key) = key.take() else {
                    return Err(complex_key(location));
                };
                if key.merge {
                    check_merge_source(&node, key.location)?;
                    merges.push(node);
                    return Ok(());
                }
                insert(map, key, node, self.options.duplicate_keys)
            }
        }
    }
}

fn complex_key(location: Location) -> Error {
    Error::msg("mapping keys must be scalars").with_location(location)
}

fn insert(
    map: &mut Mapping,
    key: PendingKey,
    value: Node,
    policy: DuplicateKeyPolicy,
) -> Result<(), Error> {
    match map.entry(key.text) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
        Entry::Occupied(mut slot) => match policy {
            DuplicateKeyPolicy::Error => Err(Error::DuplicateKey {
                key: slot.key().clone(),
                location: key.location,
            }),
            DuplicateKeyPolicy::FirstWins => Ok(()),
            DuplicateKeyPolicy::LastWins => {
                slot.insert(value);
                Ok(())
            }
        },
    }
}

fn check_merge_source(node: &Node, location: Location) -> Result<(), Error> {
    let valid = match node {
        Node::Mapping(_) => true,
        Node::Sequence(items) => items.iter().all(|item| matches!(item, Node::Mapping(_))),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::msg("`<<` expects a mapping or a sequence of mappings").with_location(location))
    }
}

/// Adds merged entries for keys the mapping does not define. Sources are applied in
/// order, so the first source defining a key wins.
fn apply_merges(map: &mut Mapping, merges: Vec<Node>) {
    let mut absorb = |source: Mapping| {
        for (key, value) in source {
            map.entry(key).or_insert(value);
        }
    };
    for merge in merges {
        match merge {
            Node::Mapping(source) => absorb(source),
            Node::Sequence(sources) => {
                for source in sources {
                    if let Node::Mapping(source) = source {
                        absorb(source);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_null() {
        assert_eq!(from_str("").unwrap(), Node::NULL);
        assert!(from_multiple("").unwrap().is_empty());
    }

    #[test]
    fn trailing_empty_documents_are_ignored() {
        assert_eq!(from_str("a: 1\n---\n").unwrap().to_string(), "{a: 1}");
        let docs = from_multiple("---\na: 1\n---\n").unwrap();
        assert_eq!(docs.len(), 1);
        // Explicit nulls are documents.
        assert_eq!(from_multiple("~\n---\nnull\n").unwrap(), [Node::NULL, Node::NULL]);
    }

    #[test]
    fn keys_keep_their_source_text() {
        let node = from_str("1: one\ntrue: yes\n~: nothing\n").unwrap();
        let keys: Vec<&str> = node.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["1", "true", "~"]);
    }

    #[test]
    fn quoted_scalars_stay_strings() {
        let node = from_str("a: '1'\nb: \"true\"\nc: 1\n").unwrap();
        assert_eq!(node.get("a"), Some(&Node::from("1")));
        assert_eq!(node.get("b"), Some(&Node::from("true")));
        assert_eq!(node.get("c"), Some(&Node::from(1)));
    }

    #[test]
    fn complex_keys_are_rejected() {
        let err = from_str("? [a, b]\n: 1\n").unwrap_err();
        assert!(err.to_string().starts_with("mapping keys must be scalars"), "{err}");
    }
}
