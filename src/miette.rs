//! `miette` diagnostics, behind the `miette` feature.

use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::error::{Error, Location};

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            Error::Message { .. } => "saphyr_wire::syntax",
            Error::UnknownAnchor { .. } => "saphyr_wire::unknown_anchor",
            Error::Budget { .. } => "saphyr_wire::budget",
            Error::DuplicateKey { .. } => "saphyr_wire::duplicate_key",
            Error::MultipleDocuments { .. } => "saphyr_wire::multiple_documents",
            Error::Resolution { .. } => "saphyr_wire::resolution",
            Error::Construction { .. } => "saphyr_wire::construction",
            Error::ArgumentMerge { .. } => "saphyr_wire::argument_merge",
            Error::Token { .. } => "saphyr_wire::token",
            Error::Io { .. } => "saphyr_wire::io",
            Error::Document { .. } => "saphyr_wire::document",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            Error::Resolution { .. } => "register the class with `Registry::register` before resolving",
            Error::ArgumentMerge { .. } => "only keyword (mapping) arguments can be merged into held keyword arguments",
            Error::DuplicateKey { .. } => "remove the repeated key or relax `Options::duplicate_keys`",
            Error::MultipleDocuments { .. } => "use `from_multiple` to load a document stream",
            Error::Budget { .. } => "raise the limit in `Options::budget` if the document is trusted",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match self {
            Error::Document { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Byte offset of a 1-indexed line/column in `source`.
fn offset_of(source: &str, location: Location) -> Option<usize> {
    let line = usize::try_from(location.line()).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column()).ok()?.saturating_sub(1);
    let mut offset = 0;
    let mut lines = 0;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx == line {
            let within = text
                .char_indices()
                .nth(column)
                .map_or(text.len(), |(byte, _)| byte);
            return Some(offset + within);
        }
        offset += text.len();
        lines += 1;
    }
    // End of input sits on the line after the last newline.
    (line == lines).then_some(offset)
}

#[derive(Debug)]
struct Located {
    error: Error,
    src: NamedSource<String>,
    span: Option<SourceSpan>,
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for Located {}

impl Diagnostic for Located {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.error.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.error.help()
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some("here".to_owned()),
            span,
        ))))
    }
}

/// A report that points into `source` (the text of `file`) when `err` has a location.
pub fn to_miette_report(err: Error, source: &str, file: &str) -> miette::Report {
    let span = err
        .location()
        .and_then(|location| offset_of(source, location))
        .map(|offset| SourceSpan::from((offset, 1)));
    miette::Report::new(Located {
        error: err,
        src: NamedSource::new(file, source.to_owned()),
        span,
    })
}
