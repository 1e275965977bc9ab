//! Parser for rule text
//!
//! A rule is a command followed by `name: value` arguments:
//!
//! ```text
//! rename col: a, b to: 'x', 'y'
//! keep row: length(name) > 3 && gold >= 100
//! split col: tags on: ',' limit: 2
//! ```
//!
//! Produces [`RuleArgs`]; [`Rule::from_args`](crate::Rule::from_args) turns
//! those into a typed rule.

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::ast::rule::RuleArgs;
use crate::ast::{Expr, Literal, Operand};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {}, offset {})",
            self.message, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for ParseError {}

/// Parse rule text into its command and arguments
pub fn parse(input: &str) -> Result<RuleArgs, ParseError> {
    let input = input.trim();
    let mut stream = input;

    let kind = ident_str
        .parse_next(&mut stream)
        .map_err(|_| build_parse_error("expected a command name".into(), input, 0))?;
    let mut args = RuleArgs::new(kind);

    loop {
        let rest = stream.trim_start();
        if rest.is_empty() {
            break;
        }
        if rest.len() == stream.len() {
            let offset = input.len() - stream.len();
            return Err(build_parse_error(
                "expected whitespace before argument".into(),
                input,
                offset,
            ));
        }
        stream = rest;

        let offset = input.len() - stream.len();
        let (key, value) = argument.parse_next(&mut stream).map_err(|_| {
            let failed_at = input.len().saturating_sub(stream.len()).max(offset);
            build_parse_error("expected argument `name: value`".into(), input, failed_at)
        })?;
        if args.insert(key.clone(), value).is_some() {
            return Err(build_parse_error(
                format!("duplicate argument '{key}'"),
                input,
                offset,
            ));
        }
    }

    Ok(args)
}

fn build_parse_error(message: String, input: &str, offset: usize) -> ParseError {
    let (line, column) = offset_to_line_column(input, offset);
    ParseError {
        message,
        offset,
        line,
        column,
    }
}

fn offset_to_line_column(input: &str, offset: usize) -> (usize, usize) {
    let bounded = offset.min(input.len());
    let mut line = 1usize;
    let mut column = 1usize;

    for ch in input[..bounded].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

// ============ Arguments ============

fn argument(input: &mut &str) -> PResult<(String, Operand)> {
    (ident_str, ws, ':', ws, value_list)
        .map(|(key, _, _, _, value)| (key, value))
        .parse_next(input)
}

/// `a` is a single operand, `a, b, c` a list
fn value_list(input: &mut &str) -> PResult<Operand> {
    separated(1.., expr, (ws, ',', ws))
        .map(|items: Vec<Expr>| Operand::from(items))
        .parse_next(input)
}

// ============ Expressions (lowest precedence first) ============

fn expr(input: &mut &str) -> PResult<Expr> {
    or_expr.parse_next(input)
}

fn or_expr(input: &mut &str) -> PResult<Expr> {
    let first = and_expr.parse_next(input)?;
    let rest: Vec<Expr> = repeat(0.., preceded((ws, "||", ws), and_expr)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, r| l.binop("||", r)))
}

fn and_expr(input: &mut &str) -> PResult<Expr> {
    let first = cmp_expr.parse_next(input)?;
    let rest: Vec<Expr> = repeat(0.., preceded((ws, "&&", ws), cmp_expr)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, r| l.binop("&&", r)))
}

fn cmp_expr(input: &mut &str) -> PResult<Expr> {
    let left = add_expr.parse_next(input)?;
    let rest: Option<(&str, Expr)> =
        opt((ws, cmp_op, ws, add_expr).map(|(_, op, _, e)| (op, e))).parse_next(input)?;
    match rest {
        Some((op, right)) => Ok(left.binop(op, right)),
        None => Ok(left),
    }
}

fn cmp_op<'a>(input: &mut &'a str) -> PResult<&'a str> {
    alt(("==", "!=", "<=", ">=", "<", ">")).parse_next(input)
}

fn add_expr(input: &mut &str) -> PResult<Expr> {
    let first = mul_expr.parse_next(input)?;
    let rest: Vec<(char, Expr)> =
        repeat(0.., (ws, one_of(['+', '-']), ws, mul_expr).map(|(_, op, _, e)| (op, e)))
            .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |l, (op, r)| l.binop(op.to_string(), r)))
}

fn mul_expr(input: &mut &str) -> PResult<Expr> {
    let first = primary.parse_next(input)?;
    let rest: Vec<(char, Expr)> = repeat(
        0..,
        (ws, one_of(['*', '/', '%']), ws, primary).map(|(_, op, _, e)| (op, e)),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |l, (op, r)| l.binop(op.to_string(), r)))
}

// ============ Primary expressions ============

fn primary(input: &mut &str) -> PResult<Expr> {
    alt((
        paren_expr,
        call,
        literal.map(Expr::Literal),
        ident_str.map(|name| Expr::Literal(Literal::Ident(name))),
        quoted_ident.map(|name| Expr::Literal(Literal::Ident(name))),
    ))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> PResult<Expr> {
    delimited(('(', ws), expr, (ws, ')')).parse_next(input)
}

/// Function call: `sum(a)`, `now()`
fn call(input: &mut &str) -> PResult<Expr> {
    (
        ident_str,
        preceded(
            ws,
            delimited(
                '(',
                (ws, opt(call_args), ws).map(|(_, args, _)| args.unwrap_or_default()),
                ')',
            ),
        ),
    )
        .map(|(name, args)| Expr::call(name, args))
        .parse_next(input)
}

fn call_args(input: &mut &str) -> PResult<Vec<Expr>> {
    terminated(
        separated(1.., expr, (ws, ',', ws)),
        opt((ws, ',')), // trailing comma
    )
    .parse_next(input)
}

// ============ Identifiers ============

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ident_str(input: &mut &str) -> PResult<String> {
    (one_of(is_ident_start), take_while(0.., is_ident_char))
        .take()
        .map(str::to_string)
        .parse_next(input)
}

/// Column names with spaces or symbols: `` `unit price` ``
fn quoted_ident(input: &mut &str) -> PResult<String> {
    delimited('`', take_till(0.., '`'), '`')
        .map(str::to_string)
        .parse_next(input)
}

// ============ Literals ============

fn literal(input: &mut &str) -> PResult<Literal> {
    alt((bool_lit, float_lit, int_lit, string_lit, regex_lit)).parse_next(input)
}

/// `true` but not `trueish`
fn bool_lit(input: &mut &str) -> PResult<Literal> {
    terminated(
        alt(("true".value(true), "false".value(false))),
        not(one_of(is_ident_char)),
    )
    .map(Literal::Bool)
    .parse_next(input)
}

fn int_lit(input: &mut &str) -> PResult<Literal> {
    (opt('-'), digit1)
        .take()
        .try_map(|s: &str| s.parse::<i64>())
        .map(Literal::Int)
        .parse_next(input)
}

fn float_lit(input: &mut &str) -> PResult<Literal> {
    (opt('-'), digit1, '.', digit1)
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .map(Literal::Float)
        .parse_next(input)
}

fn string_lit(input: &mut &str) -> PResult<Literal> {
    alt((
        delimited('"', string_contents('"'), '"'),
        delimited('\'', string_contents('\''), '\''),
    ))
    .map(Literal::String)
    .parse_next(input)
}

fn string_contents<'a>(quote: char) -> impl FnMut(&mut &'a str) -> PResult<String> {
    move |input: &mut &'a str| {
        let mut result = String::new();
        loop {
            let Some(c) = input.chars().next() else {
                return Err(backtrack());
            };
            if c == quote {
                break;
            } else if c == '\\' {
                *input = &input[1..];
                let Some(escaped) = input.chars().next() else {
                    return Err(backtrack());
                };
                let unescaped = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    _ => escaped, // quotes, backslash, unknown escapes pass through
                };
                result.push(unescaped);
                *input = &input[escaped.len_utf8()..];
            } else {
                result.push(c);
                *input = &input[c.len_utf8()..];
            }
        }
        Ok(result)
    }
}

/// `/[0-9]+/`; backslash escapes are kept as written for the regex engine
fn regex_lit(input: &mut &str) -> PResult<Literal> {
    delimited('/', regex_contents, '/')
        .map(Literal::Regex)
        .parse_next(input)
}

fn regex_contents(input: &mut &str) -> PResult<String> {
    let mut result = String::new();
    loop {
        let Some(c) = input.chars().next() else {
            return Err(backtrack());
        };
        if c == '/' {
            break;
        }
        result.push(c);
        *input = &input[c.len_utf8()..];
        if c == '\\' {
            let Some(escaped) = input.chars().next() else {
                return Err(backtrack());
            };
            result.push(escaped);
            *input = &input[escaped.len_utf8()..];
        }
    }
    Ok(result)
}

fn backtrack() -> winnow::error::ErrMode<winnow::error::ContextError> {
    winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new())
}

// ============ Whitespace ============

fn ws(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}

// ============ Sanity Tests ============
// Rule construction from these arguments is covered in tests/integration.rs
