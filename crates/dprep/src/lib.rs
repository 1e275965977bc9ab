//! dprep - text utilities for a data-preparation tool
//!
//! Two facilities:
//! - splitting delimited text lines into fields, honouring quotes
//! - describing transformation rules in one readable sentence
//!
//! ## Quick Start
//!
//! ```
//! use dprep::{short_rule_summary, tokenize};
//!
//! let fields = tokenize(r#"a,"b,c",d"#, ",", "\"");
//! assert_eq!(fields, vec!["a", "b,c", "d"]);
//!
//! let summary = short_rule_summary("rename col: a to: 'b'").unwrap();
//! assert_eq!(summary, "Rename a to 'b'");
//! ```
//!
//! ## Rule forms
//!
//! - rule text: `settype col: a, b type: long`
//! - rule JSON: `{"name": "settype", "col": {"value": ["a", "b"]}, "type": "long"}`
//! - create shorthand: `create with: <dataset id>`, never sent through the parser

mod ast;
mod grid;
mod json;
mod parse;
mod pretty;
mod summary;
mod tokenize;

use thiserror::Error;

// ============ Primary Public API ============

pub use ast::rule::{
    CREATE_RULE_PREFIX, KNOWN_KINDS, MoveTarget, Rule, RuleArgs, RuleError, SortOrder,
    is_known_kind,
};
pub use ast::{Expr, Literal, Operand};
pub use grid::{Grid, LoadError, SplitOptions, load_grid};
pub use pretty::{SHORTEN_THRESHOLD, combine_count_and_unit, shorten};
pub use summary::summarize;
pub use tokenize::tokenize;

/// Parse rule text into a typed rule
///
/// Text starting with [`CREATE_RULE_PREFIX`] bypasses the parser and
/// becomes a [`Rule::Create`] holding the rest of the text.
pub fn parse_rule(text: &str) -> Result<Rule, PrepError> {
    if let Some(ds_id) = upstream_ds_id(text) {
        return Ok(Rule::Create {
            with: ds_id.to_string(),
        });
    }
    let args = parse::parse(text)?;
    Ok(Rule::from_args(args)?)
}

/// Rule text -> rule JSON string
pub fn json_rule_string(text: &str) -> Result<String, PrepError> {
    let rule = parse_rule(text)?;
    Ok(rule.to_json().to_string())
}

/// Rule JSON string -> one-line description
pub fn short_rule_string(json: &str) -> Result<String, PrepError> {
    let rule = Rule::from_json_str(json)?;
    let summary = summarize(&rule);
    log::trace!("summarized {} rule: {}", rule.kind(), summary);
    Ok(summary)
}

/// Rule text -> one-line description
pub fn short_rule_summary(text: &str) -> Result<String, PrepError> {
    parse_rule(text).map(|rule| summarize(&rule))
}

// ============ Create shorthand ============

/// `create with: <ds_id>`
pub fn create_rule_string(ds_id: &str) -> String {
    Rule::create_shorthand(ds_id)
}

/// The dataset id of a create shorthand, or `None` for any other rule text
pub fn upstream_ds_id(text: &str) -> Option<&str> {
    text.strip_prefix(CREATE_RULE_PREFIX)
}

/// Create shorthand -> rule JSON, without going through the parser
pub fn create_json_rule_string(text: &str) -> Option<String> {
    upstream_ds_id(text).map(|ds_id| {
        Rule::Create {
            with: ds_id.to_string(),
        }
        .to_json()
        .to_string()
    })
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Parse error: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

pub use parse::ParseError;

// ============ Advanced: parser access ============

/// Low-level access to the parsing stages
pub mod advanced {
    pub use crate::parse::parse as parse_args;
}
