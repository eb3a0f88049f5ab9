//! YAML core-schema tags, in all the spellings the parser reports them.

/// The core tags that change how a scalar is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CoreTag {
    Str,
    Int,
    Float,
    Bool,
    Null,
    Seq,
    Map,
}

const SPELLINGS: &[(&str, CoreTag)] = &[
    ("str", CoreTag::Str),
    ("int", CoreTag::Int),
    ("float", CoreTag::Float),
    ("bool", CoreTag::Bool),
    ("null", CoreTag::Null),
    ("seq", CoreTag::Seq),
    ("map", CoreTag::Map),
];

impl CoreTag {
    /// Recognises `!!int`, `!int`, `tag:yaml.org,2002:int` and `tag:yaml.org,2002:!int`
    /// (likewise for the other names). Anything else is a custom tag.
    pub(crate) fn classify(tag: &str) -> Option<Self> {
        let name = tag
            .strip_prefix("tag:yaml.org,2002:")
            .map(|rest| rest.strip_prefix('!').unwrap_or(rest))
            .or_else(|| tag.strip_prefix("!!"))
            .or_else(|| tag.strip_prefix('!'))?;
        SPELLINGS
            .iter()
            .find(|(spelling, _)| *spelling == name)
            .map(|(_, core)| *core)
    }

    pub(crate) fn name(self) -> &'static str {
        SPELLINGS
            .iter()
            .find(|(_, core)| *core == self)
            .map_or("?", |(spelling, _)| spelling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_spellings_classify() {
        for tag in ["!!int", "!int", "tag:yaml.org,2002:int", "tag:yaml.org,2002:!int"] {
            assert_eq!(CoreTag::classify(tag), Some(CoreTag::Int), "{tag}");
        }
        assert_eq!(CoreTag::classify("!!str"), Some(CoreTag::Str));
        assert_eq!(CoreTag::classify("!custom"), None);
        assert_eq!(CoreTag::classify("tag:example.com,2000:int"), None);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(CoreTag::Float.name(), "float");
    }
}
