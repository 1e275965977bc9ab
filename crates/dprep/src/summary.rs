//! One-line, human-readable descriptions of rules

use crate::ast::rule::{MoveTarget, Rule};
use crate::pretty::{combine_count_and_unit, shorten};

/// Describe a rule in a short sentence, e.g. `"Convert row 1 to header"`
pub fn summarize(rule: &Rule) -> String {
    match rule {
        Rule::Create { with } => format!("create with: {}", with),
        Rule::Header { rownum } => format!("Convert row {} to header", rownum),
        Rule::Keep { row } => format!("Keep rows where {}", row),
        Rule::Rename { col, to } => {
            if col.is_long_list() {
                format!("Rename {}", shorten(col))
            } else {
                format!("Rename {} to {}", col, to)
            }
        }
        Rule::Nest { col, into } => format!("Convert {} into {}", col, into),
        Rule::Unnest { col } => format!("Create a new column from {}", col),
        Rule::SetType { col, ty } => format!("set type {} to {}", shorten(col), ty),
        Rule::SetFormat { col, format } => {
            format!("set format {} to {}", shorten(col), format)
        }
        Rule::Derive { value, alias } => format!("Create {} from {}", alias, value),
        Rule::Delete { row } => format!("Delete rows where {}", row),
        Rule::Set { col, value } => format!("Set {} to {}", shorten(col), value),
        Rule::Split { col, on, limit } => {
            // splitting N times yields N + 1 columns
            let count = combine_count_and_unit(u64::from(*limit) + 1, "column");
            format!("Split {} into {} on {}", col, count, on)
        }
        Rule::Extract { col, on, limit } => {
            let count = combine_count_and_unit(u64::from(limit.get()), "time");
            format!("Extract {} {} from {}", on, count, col)
        }
        Rule::Flatten { col } => format!("Convert arrays in {} to rows", col),
        Rule::CountPattern { col, on } => {
            format!("Count occurrences of {} in {}", on, shorten(col))
        }
        Rule::Sort { order, direction } => {
            format!("Sort rows by {} {}", order, direction.as_str())
        }
        Rule::Replace { col, on, with } => {
            if col.is_long_list() {
                format!("Replace {}", shorten(col))
            } else {
                format!("Replace {} from {} with {}", on, shorten(col), with)
            }
        }
        Rule::Merge { col, with } => format!("Concatenate {} separated by {}", col, with),
        Rule::Aggregate { value, group } => {
            format!("Aggregate with {} grouped by {}", value, shorten(group))
        }
        Rule::Move { col, target } => match target {
            MoveTarget::Before(before) => format!("Move {} before {}", shorten(col), before),
            MoveTarget::After(after) => format!("Move {} after {}", shorten(col), after),
        },
        Rule::Unknown { kind } => format!("{} unknown", kind),
    }
}

impl Rule {
    /// See [`summarize`]
    pub fn summary(&self) -> String {
        summarize(self)
    }
}
