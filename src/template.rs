//! `{{ ... }}` token substitution.
//!
//! A string scalar whose trimmed text is a single `{{ token }}` is handed to a
//! [`TokenResolver`] with the delimiters and surrounding blanks removed. Whatever the
//! resolver returns replaces the scalar. When the resolver fails the scalar is kept as
//! written: a template that cannot be expanded is left for the reader to see rather
//! than aborting the load.
//!
//! Built-in resolvers:
//! - [`RelativePath`]: `{{ relative: data/train.csv }}` becomes an absolute path next
//!   to the file being processed.
//! - [`EnvVar`]: `{{ env: HOME }}` becomes the variable's value.
//! - [`FileTokens`]: both of the above, and any other token is a document to load
//!   relative to the current file, expanded recursively.
//!
//! Resolvers combine as tuples: `(RelativePath::new(f), EnvVar)` tries each in turn.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::loader::from_path_with_options;
use crate::node::{Node, Scalar};
use crate::options::Options;
use crate::visitor::Visitor;

pub const RELATIVE_PREFIX: &str = "relative:";
pub const ENV_PREFIX: &str = "env:";

/// How many documents [`FileTokens`] may nest before giving up.
pub const MAX_INCLUDE_DEPTH: usize = 32;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{(.*)\}\}$").expect("valid regex"));

/// The inner text of a `{{ ... }}` token, trimmed; `None` if `text` is not one.
pub fn parse_token(text: &str) -> Option<&str> {
    let captures = TOKEN.captures(text.trim())?;
    captures.get(1).map(|inner| inner.as_str().trim())
}

/// Turns the inner text of a token into a node.
pub trait TokenResolver {
    fn resolve(&mut self, token: &str) -> Result<Node, Error>;
}

impl<F> TokenResolver for F
where
    F: FnMut(&str) -> Result<Node, Error>,
{
    fn resolve(&mut self, token: &str) -> Result<Node, Error> {
        self(token)
    }
}

impl<A: TokenResolver, B: TokenResolver> TokenResolver for (A, B) {
    fn resolve(&mut self, token: &str) -> Result<Node, Error> {
        self.0.resolve(token).or_else(|_| self.1.resolve(token))
    }
}

/// Substitutes template tokens in string scalars.
#[derive(Debug, Default)]
pub struct TemplateVisitor<R> {
    resolver: R,
}

impl<R: TokenResolver> TemplateVisitor<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: TokenResolver> Visitor for TemplateVisitor<R> {
    fn visit_scalar(&mut self, scalar: &Scalar) -> Result<Node, Error> {
        let Some(token) = scalar.as_str().and_then(parse_token) else {
            return Ok(Node::Scalar(scalar.clone()));
        };
        match self.resolver.resolve(token) {
            Ok(node) => Ok(node),
            Err(err) => {
                tracing::debug!(token, error = %err, "template token left unexpanded");
                Ok(Node::Scalar(scalar.clone()))
            }
        }
    }
}

/// Strips `prefix` and the blanks after it.
fn strip_keyword<'t>(token: &'t str, prefix: &str) -> Option<&'t str> {
    token.strip_prefix(prefix).map(str::trim)
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
pub fn normalize(path: &Path) -> Result<PathBuf, Error> {
    let absolute = std::path::absolute(path).map_err(|cause| Error::io(path, cause))?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// `target` interpreted next to `file`, normalised.
fn sibling(file: &Path, target: &str) -> Result<PathBuf, Error> {
    let dir = file.parent().unwrap_or(Path::new(""));
    normalize(&dir.join(target))
}

/// Resolves `relative: <path>` against the directory of `file`.
#[derive(Clone, Debug)]
pub struct RelativePath {
    file: PathBuf,
}

impl RelativePath {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

impl TokenResolver for RelativePath {
    fn resolve(&mut self, token: &str) -> Result<Node, Error> {
        let target = strip_keyword(token, RELATIVE_PREFIX)
            .ok_or_else(|| Error::token(token, format!("expected `{RELATIVE_PREFIX}` prefix")))?;
        let path = sibling(&self.file, target)?;
        Ok(Node::from(path.to_string_lossy().into_owned()))
    }
}

/// Resolves `env: NAME` to the value of the environment variable.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvVar;

impl TokenResolver for EnvVar {
    fn resolve(&mut self, token: &str) -> Result<Node, Error> {
        let name = strip_keyword(token, ENV_PREFIX)
            .ok_or_else(|| Error::token(token, format!("expected `{ENV_PREFIX}` prefix")))?;
        std::env::var(name)
            .map(Node::from)
            .map_err(|err| Error::token(token, err.to_string()))
    }
}

/// `relative:` and `env:` tokens, with any other token naming a document next to the
/// current file.
///
/// A document token is loaded and expanded with a new `FileTokens` whose current file
/// is the loaded one, so nested relative tokens resolve against the file they are
/// written in.
#[derive(Clone, Debug)]
pub struct FileTokens {
    file: PathBuf,
    options: Options,
    depth: usize,
}

impl FileTokens {
    pub fn new(file: impl Into<PathBuf>, options: Options) -> Self {
        Self {
            file: file.into(),
            options,
            depth: 0,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn load(&self, target: &str) -> Result<Node, Error> {
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::token(
                target,
                format!("documents nest deeper than {MAX_INCLUDE_DEPTH} levels"),
            ));
        }
        let path = sibling(&self.file, target)?;
        tracing::debug!(path = %path.display(), depth = self.depth + 1, "expanding document token");
        let document = from_path_with_options(&path, &self.options)?;
        let nested = FileTokens {
            file: path,
            options: self.options.clone(),
            depth: self.depth + 1,
        };
        TemplateVisitor::new(nested).visit(&document)
    }
}

impl TokenResolver for FileTokens {
    fn resolve(&mut self, token: &str) -> Result<Node, Error> {
        if token.starts_with(RELATIVE_PREFIX) {
            RelativePath::new(self.file.as_path()).resolve(token)
        } else if token.starts_with(ENV_PREFIX) {
            EnvVar.resolve(token)
        } else {
            self.load(token)
        }
    }
}

/// Loads `path` and expands its tokens with [`FileTokens`].
pub fn load_with_templates(path: impl AsRef<Path>, options: &Options) -> Result<Node, Error> {
    let path = path.as_ref();
    let document = from_path_with_options(path, options)?;
    TemplateVisitor::new(FileTokens::new(path, options.nested())).visit(&document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_recognised_after_trimming() {
        assert_eq!(parse_token("  {{ relative: a.yml }} "), Some("relative: a.yml"));
        assert_eq!(parse_token("{{}}"), Some(""));
        assert_eq!(parse_token("prefix {{ x }}"), None);
        assert_eq!(parse_token("{{ x }"), None);
        assert_eq!(parse_token("{{ a\nb }}"), None);
    }

    #[test]
    fn failing_resolver_keeps_the_original_text() {
        let mut visitor =
            TemplateVisitor::new(|token: &str| -> Result<Node, Error> {
                Err(Error::token(token, "no such token"))
            });
        let input = Node::from("{{ missing }}");
        assert_eq!(visitor.visit(&input).unwrap(), input);
    }

    #[test]
    fn closures_resolve_tokens() {
        let mut visitor = TemplateVisitor::new(|token: &str| -> Result<Node, Error> {
            Ok(Node::from(token.len() as i64))
        });
        let input: Node = [("a", "{{ four }}"), ("b", "four")].into_iter().collect();
        let expected: Node = [("a", Node::from(4)), ("b", Node::from("four"))]
            .into_iter()
            .collect();
        assert_eq!(visitor.visit(&input).unwrap(), expected);
    }

    #[test]
    fn relative_paths_fold_parent_segments() {
        let mut resolver = RelativePath::new("/srv/conf/model.yml");
        assert_eq!(
            resolver.resolve("relative: ../data/./train.csv").unwrap(),
            Node::from("/srv/data/train.csv")
        );
        assert!(resolver.resolve("data.csv").is_err());
    }

    #[test]
    fn tuple_falls_through_to_the_second_resolver() {
        let mut resolver = (RelativePath::new("/srv/a.yml"), |_: &str| -> Result<Node, Error> {
            Ok(Node::from(1))
        });
        assert_eq!(resolver.resolve("env: X").unwrap(), Node::from(1));
        assert_eq!(
            resolver.resolve("relative: b").unwrap(),
            Node::from("/srv/b")
        );
    }
}
