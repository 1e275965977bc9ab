//! AST types for rules
//!
//! Split into:
//! - this module: the expression tree shared by every rule field
//! - `rule`: one variant per transformation kind

pub mod rule;

/// Leaf value of an expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Column or bare word: `gold`, `` `unit price` ``
    Ident(String),
    /// Quoted string; holds the unquoted contents
    String(String),
    /// Regular expression between slashes; holds the pattern only
    Regex(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    /// Text of the literal with any quoting removed
    pub fn escaped_value(&self) -> String {
        match self {
            Literal::Ident(s) | Literal::String(s) | Literal::Regex(s) => s.clone(),
            Literal::Int(n) => n.to_string(),
            Literal::Float(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),

    /// Binary operation: `a + b`, `a == b`
    BinaryOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },

    /// Function call: `name(args...)`
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Literal(Literal::Ident(name.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn binop(self, op: impl Into<String>, rhs: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op: op.into(),
            right: Box::new(rhs),
        }
    }

    /// Unquoted text when this node is a literal
    pub fn escaped_value(&self) -> Option<String> {
        match self {
            Expr::Literal(lit) => Some(lit.escaped_value()),
            _ => None,
        }
    }
}

/// Value of a rule field: one expression or an ordered list of them
///
/// Column references (`col: a, b, c`) are the common list case.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(Expr),
    List(Vec<Expr>),
}

impl Operand {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operand::List(names.into_iter().map(Expr::ident).collect())
    }

    /// Number of expressions held
    pub fn len(&self) -> usize {
        match self {
            Operand::Single(_) => 1,
            Operand::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for a list long enough to be collapsed into a count
    pub fn is_long_list(&self) -> bool {
        matches!(self, Operand::List(items) if items.len() >= crate::pretty::SHORTEN_THRESHOLD)
    }

    pub fn exprs(&self) -> &[Expr] {
        match self {
            Operand::Single(expr) => std::slice::from_ref(expr),
            Operand::List(items) => items,
        }
    }
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand::Single(expr)
    }
}

impl From<Vec<Expr>> for Operand {
    fn from(mut items: Vec<Expr>) -> Self {
        if items.len() == 1 {
            Operand::Single(items.remove(0))
        } else {
            Operand::List(items)
        }
    }
}
