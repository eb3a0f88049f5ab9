//! Resource limits for loading configuration documents.
//!
//! The loader feeds every parser event through a [`BudgetEnforcer`] before the event
//! touches the tree, so an oversized or hostile document is rejected before it is
//! materialised. [`check_yaml_budget`] runs the same accounting without building
//! anything.

use ahash::AHashSet;
use saphyr_parser::{Event, Parser};

use crate::error::{budget_error, Error};

/// Limits for one load.
///
/// The defaults accept any realistic configuration file while stopping documents that
/// try to amplify themselves.
///
/// ```rust
/// use saphyr_wire::{budget, options, Error};
///
/// let options = options! {
///     budget: Some(budget! { max_depth: 2 }),
/// };
/// let err = saphyr_wire::from_str_with_options("a: {b: {c: 1}}", &options).unwrap_err();
/// assert!(matches!(err, Error::Budget { .. }));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    /// Parser events of any kind. Default: 1,000,000
    pub max_events: usize,
    /// Alias (`*ref`) events. Default: 50,000
    pub max_aliases: usize,
    /// Distinct anchors (`&name`). Default: 50,000
    pub max_anchors: usize,
    /// Nesting of sequences and mappings. Default: 2,000
    pub max_depth: usize,
    /// Documents in one stream. Default: 1,024
    pub max_documents: usize,
    /// Scalars, sequences and mappings. Default: 250,000
    pub max_nodes: usize,
    /// Sum of scalar lengths in bytes. Default: 64 MiB
    pub max_total_scalar_bytes: usize,
    /// Merge keys (`<<`). Default: 10,000
    pub max_merge_keys: usize,
    /// Reject documents that use far more aliases than anchors. Default: true
    pub enforce_alias_anchor_ratio: bool,
    /// Aliases needed before the ratio is checked. Default: 100
    pub alias_anchor_min_aliases: usize,
    /// Breach when `aliases > multiplier * anchors`. Default: 10
    pub alias_anchor_ratio_multiplier: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_documents: 1_024,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
            max_merge_keys: 10_000,
            enforce_alias_anchor_ratio: true,
            alias_anchor_min_aliases: 100,
            alias_anchor_ratio_multiplier: 10,
        }
    }
}

/// The limit that was exceeded, with the count that exceeded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    Events { events: usize },
    Aliases { aliases: usize },
    Anchors { anchors: usize },
    Depth { depth: usize },
    Documents { documents: usize },
    Nodes { nodes: usize },
    ScalarBytes { total_scalar_bytes: usize },
    MergeKeys { merge_keys: usize },
    AliasAnchorRatio { aliases: usize, anchors: usize },
    /// A container closed that was never opened.
    Unbalanced,
}

/// Counters collected during a load, with the breach if there was one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetReport {
    pub breached: Option<BudgetBreach>,
    pub events: usize,
    pub aliases: usize,
    pub anchors: usize,
    pub documents: usize,
    pub nodes: usize,
    pub max_depth: usize,
    pub total_scalar_bytes: usize,
    pub merge_keys: usize,
}

/// Applies a [`Budget`] to a stream of parser events.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    anchors: AHashSet<usize>,
}

fn over(count: usize, limit: usize, breach: impl FnOnce(usize) -> BudgetBreach) -> Result<(), BudgetBreach> {
    if count > limit { Err(breach(count)) } else { Ok(()) }
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            anchors: AHashSet::with_capacity(64),
        }
    }

    /// Accounts for one event. Fails on the first exceeded limit.
    pub fn observe(&mut self, event: &Event) -> Result<(), BudgetBreach> {
        self.report.events += 1;
        over(self.report.events, self.budget.max_events, |events| {
            BudgetBreach::Events { events }
        })?;

        match event {
            Event::DocumentStart(_) => {
                self.report.documents += 1;
                over(self.report.documents, self.budget.max_documents, |documents| {
                    BudgetBreach::Documents { documents }
                })?;
            }
            Event::Alias(_) => {
                self.report.aliases += 1;
                over(self.report.aliases, self.budget.max_aliases, |aliases| {
                    BudgetBreach::Aliases { aliases }
                })?;
            }
            Event::Scalar(value, _, anchor, _) => {
                self.node()?;
                self.report.total_scalar_bytes =
                    self.report.total_scalar_bytes.saturating_add(value.len());
                over(
                    self.report.total_scalar_bytes,
                    self.budget.max_total_scalar_bytes,
                    |total_scalar_bytes| BudgetBreach::ScalarBytes { total_scalar_bytes },
                )?;
                self.anchor(*anchor)?;
            }
            Event::SequenceStart(anchor, _) | Event::MappingStart(anchor, _) => {
                self.node()?;
                self.depth += 1;
                self.report.max_depth = self.report.max_depth.max(self.depth);
                over(self.depth, self.budget.max_depth, |depth| BudgetBreach::Depth { depth })?;
                self.anchor(*anchor)?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.depth = self.depth.checked_sub(1).ok_or(BudgetBreach::Unbalanced)?;
            }
            Event::StreamStart | Event::StreamEnd | Event::DocumentEnd | Event::Nothing => {}
        }
        Ok(())
    }

    /// Accounts for a `<<` key. The loader calls this because only it knows which
    /// scalars are keys.
    pub fn observe_merge_key(&mut self) -> Result<(), BudgetBreach> {
        self.report.merge_keys += 1;
        over(self.report.merge_keys, self.budget.max_merge_keys, |merge_keys| {
            BudgetBreach::MergeKeys { merge_keys }
        })
    }

    fn node(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        over(self.report.nodes, self.budget.max_nodes, |nodes| BudgetBreach::Nodes { nodes })
    }

    fn anchor(&mut self, id: usize) -> Result<(), BudgetBreach> {
        if id != 0 && self.anchors.insert(id) {
            self.report.anchors = self.anchors.len();
            over(self.report.anchors, self.budget.max_anchors, |anchors| {
                BudgetBreach::Anchors { anchors }
            })?;
        }
        Ok(())
    }

    /// The report so far, marked with `breach`.
    pub fn into_breached(mut self, breach: BudgetBreach) -> BudgetReport {
        self.report.breached = Some(breach);
        self.report
    }

    /// Runs the end-of-stream checks and returns the report.
    pub fn finalize(mut self) -> BudgetReport {
        let report = &mut self.report;
        if self.budget.enforce_alias_anchor_ratio
            && report.aliases >= self.budget.alias_anchor_min_aliases
            && (report.anchors == 0
                || report.aliases > self.budget.alias_anchor_ratio_multiplier * report.anchors)
        {
            report.breached = Some(BudgetBreach::AliasAnchorRatio {
                aliases: report.aliases,
                anchors: report.anchors,
            });
        }
        self.report
    }
}

/// Scans `input` against `budget` without building a tree.
///
/// A breach is reported in [`BudgetReport::breached`]; only syntax errors are `Err`.
/// Merge keys are not counted here since that needs key positions.
pub fn check_yaml_budget(input: &str, budget: &Budget) -> Result<BudgetReport, Error> {
    let mut enforcer = BudgetEnforcer::new(budget.clone());
    for item in Parser::new_from_str(input) {
        let (event, span) = item.map_err(Error::from_scan_error)?;
        if let Err(breach) = enforcer.observe(&event) {
            tracing::debug!(?breach, line = span.start.line(), "budget exceeded");
            return Ok(enforcer.into_breached(breach));
        }
    }
    Ok(enforcer.finalize())
}

/// [`check_yaml_budget`] as a pass/fail check.
pub fn ensure_within_budget(input: &str, budget: &Budget) -> Result<BudgetReport, Error> {
    let report = check_yaml_budget(input, budget)?;
    match report.breached.clone() {
        Some(breach) => Err(budget_error(breach)),
        None => Ok(report),
    }
}
