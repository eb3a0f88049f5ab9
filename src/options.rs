use crate::budget::{Budget, BudgetReport};

/// What to do when a mapping repeats a key.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateKeyPolicy {
    /// Fail with [`Error::DuplicateKey`](crate::Error::DuplicateKey).
    #[default]
    Error,
    /// Keep the first value; later entries are dropped.
    FirstWins,
    /// Keep the last value, in the position of the first occurrence.
    LastWins,
}

/// Limits on alias expansion. Every alias copies the anchored subtree, so these bound
/// how much a small document can grow while loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasLimits {
    /// Nodes copied by all aliases together.
    pub max_total_replayed_nodes: usize,
    /// Times one anchor may be referenced. `usize::MAX` for no limit.
    pub max_alias_expansions_per_anchor: usize,
}

impl Default for AliasLimits {
    fn default() -> Self {
        Self {
            max_total_replayed_nodes: 1_000_000,
            max_alias_expansions_per_anchor: usize::MAX,
        }
    }
}

/// Loader configuration.
///
/// ```rust
/// use saphyr_wire::options::DuplicateKeyPolicy;
///
/// let options = saphyr_wire::options! {
///     duplicate_keys: DuplicateKeyPolicy::LastWins,
/// };
/// let node = saphyr_wire::from_str_with_options("a: 1\na: 2\n", &options).unwrap();
/// assert_eq!(node.get("a").and_then(|a| a.as_i64()), Some(2));
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    /// Event budget enforced while loading. `None` disables the checks.
    pub budget: Option<Budget>,
    /// Receives the budget report after every load, including failed ones. Documents
    /// pulled in by includes and `{{ }}` tokens do not report.
    pub budget_report: Option<fn(&BudgetReport)>,
    pub duplicate_keys: DuplicateKeyPolicy,
    pub alias_limits: AliasLimits,
    /// Read plain integers starting with `00` as octal, as YAML 1.1 did. Default: false.
    pub legacy_octal_numbers: bool,
    /// Only `true`/`false` (and their `True`/`TRUE` spellings) are booleans. When off,
    /// the YAML 1.1 forms `yes`/`no`/`on`/`off`/`y`/`n` are booleans too. Default: true.
    pub strict_booleans: bool,
    /// Expand `<<` merge keys. When off, `<<` is an ordinary key. Default: true.
    pub merge_keys: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            budget_report: None,
            duplicate_keys: DuplicateKeyPolicy::Error,
            alias_limits: AliasLimits::default(),
            legacy_octal_numbers: false,
            strict_booleans: true,
            merge_keys: true,
        }
    }
}

impl Options {
    /// The options for documents loaded on behalf of another one: the same limits,
    /// without the report callback.
    pub(crate) fn nested(&self) -> Options {
        Options {
            budget_report: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_options_drop_the_report() {
        fn ignore(_: &BudgetReport) {}
        let opts = Options {
            budget_report: Some(ignore as fn(&BudgetReport)),
            ..Options::default()
        };
        let nested = opts.nested();
        assert!(nested.budget_report.is_none());
        assert_eq!(nested.budget, opts.budget);
    }

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.budget, Some(Budget::default()));
        assert!(opts.budget_report.is_none());
        assert_eq!(opts.duplicate_keys, DuplicateKeyPolicy::Error);
        assert_eq!(opts.alias_limits.max_total_replayed_nodes, 1_000_000);
        assert_eq!(opts.alias_limits.max_alias_expansions_per_anchor, usize::MAX);
        assert!(!opts.legacy_octal_numbers);
        assert!(opts.strict_booleans);
        assert!(opts.merge_keys);
    }

    #[test]
    fn macro_overrides_only_named_fields() {
        let opts = crate::options! {
            legacy_octal_numbers: true,
            merge_keys: false,
        };
        assert!(opts.legacy_octal_numbers);
        assert!(!opts.merge_keys);
        assert!(opts.strict_booleans);
    }
}
