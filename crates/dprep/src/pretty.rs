//! Display rendering for rule expressions
//!
//! Expressions render flat: binary operations are joined with single spaces
//! and never parenthesized, calls render as `name(arg, arg)`.

use std::fmt::{self, Display};

use crate::ast::{Expr, Literal, Operand};

/// Lists with at least this many columns collapse to `"<n> columns"`
pub const SHORTEN_THRESHOLD: usize = 3;

// ============ Display (single-line) ============

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Ident(name) => write!(f, "{}", name),
            Literal::String(s) => write!(f, "'{}'", escape_string(s)),
            Literal::Regex(pattern) => write!(f, "/{}/", pattern),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.exprs())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

// ============ Display policy ============

/// Render a column list, collapsing long lists to a count
///
/// The operand itself is untouched; this only decides how it is shown.
pub fn shorten(operand: &Operand) -> String {
    if operand.is_long_list() {
        format!("{} columns", operand.len())
    } else {
        operand.to_string()
    }
}

/// `"1 column"`, `"3 columns"`
///
/// `count` must be at least 1.
pub fn combine_count_and_unit(count: u64, unit: &str) -> String {
    debug_assert!(count > 0, "count of {unit} must be positive");
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
