//! Rule AST - one variant per transformation kind
//!
//! Rules come from two places: the rule-language parser and the JSON codec.
//! Both collect raw `key: value` pairs into [`RuleArgs`] and hand them to
//! [`Rule::from_args`], so field requirements live in one spot.

use std::num::NonZeroU32;

use indexmap::IndexMap;
use thiserror::Error;

use super::{Expr, Literal, Operand};

/// Prefix of the raw create-rule shorthand: `create with: <dataset id>`
pub const CREATE_RULE_PREFIX: &str = "create with: ";

/// Commands with a dedicated [`Rule`] variant
pub const KNOWN_KINDS: &[&str] = &[
    "create",
    "header",
    "keep",
    "rename",
    "nest",
    "unnest",
    "settype",
    "setformat",
    "derive",
    "delete",
    "set",
    "split",
    "extract",
    "flatten",
    "countpattern",
    "sort",
    "replace",
    "merge",
    "aggregate",
    "move",
];

pub fn is_known_kind(kind: &str) -> bool {
    KNOWN_KINDS.contains(&kind)
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Rule '{kind}' is missing required field '{field}'")]
    MissingRuleField { kind: String, field: String },

    #[error("Rule '{kind}' field '{field}': expected {expected}")]
    InvalidRuleField {
        kind: String,
        field: String,
        expected: &'static str,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, RuleError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Before(String),
    After(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `create with: <dataset id>`
    Create { with: String },
    /// `header rownum: 1`
    Header { rownum: i64 },
    /// `keep row: gold > 100`
    Keep { row: Operand },
    /// `rename col: a, b to: 'x', 'y'`
    Rename { col: Operand, to: Operand },
    /// `nest col: a, b into: map as: 'm'`
    Nest { col: Operand, into: String },
    /// `unnest col: m into: map idx: 'a'`
    Unnest { col: Operand },
    /// `settype col: a type: long`
    SetType { col: Operand, ty: String },
    /// `setformat col: d format: 'yyyy-MM-dd'`
    SetFormat { col: Operand, format: String },
    /// `derive value: a + b as: 'c'`
    Derive { value: Operand, alias: String },
    /// `delete row: isnull(a)`
    Delete { row: Operand },
    /// `set col: a value: a * 2`
    Set { col: Operand, value: Operand },
    /// `split col: a on: ',' limit: 2`
    Split { col: Operand, on: Operand, limit: u32 },
    /// `extract col: a on: /[0-9]+/ limit: 3`
    Extract {
        col: Operand,
        on: Operand,
        limit: NonZeroU32,
    },
    /// `flatten col: arr`
    Flatten { col: Operand },
    /// `countpattern col: a on: 'x'`
    CountPattern { col: Operand, on: Operand },
    /// `sort order: a, b type: 'desc'`
    Sort { order: Operand, direction: SortOrder },
    /// `replace col: a on: 'x' with: 'y'`
    Replace {
        col: Operand,
        on: Operand,
        with: Operand,
    },
    /// `merge col: a, b with: '-' as: 'ab'`
    Merge { col: Operand, with: String },
    /// `aggregate value: sum(a), count() group: b`
    Aggregate { value: Operand, group: Operand },
    /// `move col: a before: b`
    Move { col: Operand, target: MoveTarget },
    /// Any other command, including the reserved `union` and `join`
    Unknown { kind: String },
}

impl Rule {
    /// The rule's command name, as written in rule text and the JSON `name` key
    pub fn kind(&self) -> &str {
        match self {
            Rule::Create { .. } => "create",
            Rule::Header { .. } => "header",
            Rule::Keep { .. } => "keep",
            Rule::Rename { .. } => "rename",
            Rule::Nest { .. } => "nest",
            Rule::Unnest { .. } => "unnest",
            Rule::SetType { .. } => "settype",
            Rule::SetFormat { .. } => "setformat",
            Rule::Derive { .. } => "derive",
            Rule::Delete { .. } => "delete",
            Rule::Set { .. } => "set",
            Rule::Split { .. } => "split",
            Rule::Extract { .. } => "extract",
            Rule::Flatten { .. } => "flatten",
            Rule::CountPattern { .. } => "countpattern",
            Rule::Sort { .. } => "sort",
            Rule::Replace { .. } => "replace",
            Rule::Merge { .. } => "merge",
            Rule::Aggregate { .. } => "aggregate",
            Rule::Move { .. } => "move",
            Rule::Unknown { kind } => kind,
        }
    }

    /// Build a rule of the given kind from its raw arguments
    pub fn from_args(mut args: RuleArgs) -> Result<Rule> {
        let kind = args.kind.clone();
        let rule = match kind.as_str() {
            "create" => Rule::Create {
                with: args.text("with")?,
            },
            "header" => Rule::Header {
                rownum: args.int("rownum")?,
            },
            "keep" => Rule::Keep {
                row: args.operand("row")?,
            },
            "rename" => Rule::Rename {
                col: args.operand("col")?,
                to: args.operand("to")?,
            },
            "nest" => Rule::Nest {
                col: args.operand("col")?,
                into: args.text("into")?,
            },
            "unnest" => Rule::Unnest {
                col: args.operand("col")?,
            },
            "settype" => Rule::SetType {
                col: args.operand("col")?,
                ty: args.text("type")?,
            },
            "setformat" => Rule::SetFormat {
                col: args.operand("col")?,
                format: args.text("format")?,
            },
            "derive" => Rule::Derive {
                value: args.operand("value")?,
                alias: args.text("as")?,
            },
            "delete" => Rule::Delete {
                row: args.operand("row")?,
            },
            "set" => Rule::Set {
                col: args.operand("col")?,
                value: args.operand("value")?,
            },
            "split" => Rule::Split {
                col: args.operand("col")?,
                on: args.operand("on")?,
                limit: args.limit("limit")?,
            },
            "extract" => Rule::Extract {
                col: args.operand("col")?,
                on: args.operand("on")?,
                limit: args.positive_limit("limit")?,
            },
            "flatten" => Rule::Flatten {
                col: args.operand("col")?,
            },
            "countpattern" => Rule::CountPattern {
                col: args.operand("col")?,
                on: args.operand("on")?,
            },
            "sort" => {
                let order = args.operand("order")?;
                let direction = match args.remove("type") {
                    Some(ty) if is_desc(&ty) => SortOrder::Desc,
                    _ => SortOrder::Asc,
                };
                Rule::Sort { order, direction }
            }
            "replace" => Rule::Replace {
                col: args.operand("col")?,
                on: args.operand("on")?,
                with: args.operand("with")?,
            },
            "merge" => Rule::Merge {
                col: args.operand("col")?,
                with: args.text("with")?,
            },
            "aggregate" => Rule::Aggregate {
                value: args.operand("value")?,
                group: args.operand("group")?,
            },
            "move" => {
                let col = args.operand("col")?;
                // before wins when both are given
                let target = match (args.opt_text("before")?, args.opt_text("after")?) {
                    (Some(before), _) => MoveTarget::Before(before),
                    (None, Some(after)) => MoveTarget::After(after),
                    (None, None) => return Err(args.missing("before/after")),
                };
                Rule::Move { col, target }
            }
            _ => Rule::Unknown { kind },
        };
        Ok(rule)
    }

    /// The raw create-rule shorthand text for a dataset
    pub fn create_shorthand(ds_id: &str) -> String {
        format!("{CREATE_RULE_PREFIX}{ds_id}")
    }
}

fn is_desc(ty: &Operand) -> bool {
    match ty {
        Operand::Single(expr) => expr
            .escaped_value()
            .is_some_and(|v| v.eq_ignore_ascii_case("DESC")),
        Operand::List(_) => false,
    }
}

/// Raw `key: value` arguments of one rule, in source order
#[derive(Debug, Clone, Default)]
pub struct RuleArgs {
    pub kind: String,
    fields: IndexMap<String, Operand>,
}

impl RuleArgs {
    pub fn new(kind: impl Into<String>) -> Self {
        RuleArgs {
            kind: kind.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field; returns the previous value if the key was already set
    pub fn insert(&mut self, key: impl Into<String>, value: Operand) -> Option<Operand> {
        self.fields.insert(key.into(), value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<Operand> {
        self.fields.shift_remove(field)
    }

    fn missing(&self, field: &str) -> RuleError {
        RuleError::MissingRuleField {
            kind: self.kind.clone(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, expected: &'static str) -> RuleError {
        RuleError::InvalidRuleField {
            kind: self.kind.clone(),
            field: field.to_string(),
            expected,
        }
    }

    fn operand(&mut self, field: &str) -> Result<Operand> {
        self.remove(field).ok_or_else(|| self.missing(field))
    }

    fn opt_text(&mut self, field: &str) -> Result<Option<String>> {
        match self.remove(field) {
            None => Ok(None),
            Some(Operand::Single(Expr::Literal(lit))) => Ok(Some(lit.escaped_value())),
            Some(Operand::Single(expr)) => Ok(Some(expr.to_string())),
            Some(Operand::List(_)) => Err(self.invalid(field, "a single value")),
        }
    }

    fn text(&mut self, field: &str) -> Result<String> {
        self.opt_text(field)?.ok_or_else(|| self.missing(field))
    }

    fn int(&mut self, field: &str) -> Result<i64> {
        match self.operand(field)? {
            Operand::Single(Expr::Literal(Literal::Int(n))) => Ok(n),
            Operand::Single(Expr::Literal(Literal::Ident(s) | Literal::String(s))) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(field, "an integer")),
            _ => Err(self.invalid(field, "an integer")),
        }
    }

    fn limit(&mut self, field: &str) -> Result<u32> {
        let n = self.int(field)?;
        u32::try_from(n).map_err(|_| self.invalid(field, "a non-negative integer"))
    }

    fn positive_limit(&mut self, field: &str) -> Result<NonZeroU32> {
        let n = self.limit(field)?;
        NonZeroU32::new(n).ok_or_else(|| self.invalid(field, "a positive integer"))
    }
}
