//! Rule <-> JSON conversion
//!
//! Wire shape:
//! - rule: `{"name": "<kind>", <field>: ...}`
//! - operand field: `{"value": <expr or scalar or array>}`
//! - string literal: `{"value": "'text'", "escapedValue": "text"}`
//! - binary op: `{"op": "==", "left": ..., "right": ...}`
//! - call: `{"name": "sum", "args": [...]}`
//!
//! Decoding accepts operand and scalar fields with or without the
//! `{"value": ...}` wrapper.

use serde_json::{Map, Value as Json, json};

use crate::ast::rule::{MoveTarget, Rule, RuleArgs, RuleError, is_known_kind};
use crate::ast::{Expr, Literal, Operand};

type Result<T> = std::result::Result<T, RuleError>;

// ============ Decoding ============

impl Expr {
    /// Decode one expression node
    pub fn from_json(value: &Json) -> Result<Expr> {
        match value {
            Json::Object(map) => expr_from_object(map),
            Json::Array(_) => Err(RuleError::MalformedExpression(
                "expected an expression, got a list".into(),
            )),
            scalar => scalar_literal(scalar).map(Expr::Literal),
        }
    }
}

fn expr_from_object(map: &Map<String, Json>) -> Result<Expr> {
    if let Some(op) = map.get("op") {
        let op = op
            .as_str()
            .ok_or_else(|| RuleError::MalformedExpression("'op' must be a string".into()))?;
        let left = required(map, "left", "binary operation")?;
        let right = required(map, "right", "binary operation")?;
        return Ok(Expr::BinaryOp {
            left: Box::new(Expr::from_json(left)?),
            op: op.to_string(),
            right: Box::new(Expr::from_json(right)?),
        });
    }

    if let Some(name) = map.get("name") {
        let name = name
            .as_str()
            .ok_or_else(|| RuleError::MalformedExpression("'name' must be a string".into()))?;
        let args = match required(map, "args", "function call")? {
            Json::Array(items) => items
                .iter()
                .map(Expr::from_json)
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(RuleError::MalformedExpression(format!(
                    "'args' of {name}() must be a list"
                )));
            }
        };
        return Ok(Expr::call(name, args));
    }

    if let Some(escaped) = map.get("escapedValue") {
        let text = escaped.as_str().map_or_else(|| escaped.to_string(), str::to_string);
        return Ok(Expr::Literal(Literal::String(text)));
    }

    match map.get("value") {
        Some(value) => Expr::from_json(value),
        None => Err(RuleError::MalformedExpression(format!(
            "node has none of op/name/value: {}",
            Json::Object(map.clone())
        ))),
    }
}

fn required<'a>(map: &'a Map<String, Json>, key: &str, what: &str) -> Result<&'a Json> {
    map.get(key)
        .ok_or_else(|| RuleError::MalformedExpression(format!("{what} without '{key}'")))
}

fn scalar_literal(value: &Json) -> Result<Literal> {
    match value {
        Json::String(s) => Ok(literal_from_text(s)),
        Json::Bool(b) => Ok(Literal::Bool(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Literal::Int(i)),
            None => n
                .as_f64()
                .map(Literal::Float)
                .ok_or_else(|| RuleError::MalformedExpression(format!("bad number {n}"))),
        },
        other => Err(RuleError::MalformedExpression(format!(
            "expected a scalar, got {other}"
        ))),
    }
}

/// `/x/` is a regex, anything else is taken as written
fn literal_from_text(s: &str) -> Literal {
    match s.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
        Some(pattern) if s.len() >= 2 => Literal::Regex(pattern.to_string()),
        _ => Literal::Ident(s.to_string()),
    }
}

impl Operand {
    /// Decode an operand field, unwrapping one `{"value": ...}` level
    pub fn from_json(value: &Json) -> Result<Operand> {
        match value {
            Json::Array(items) => items
                .iter()
                .map(Expr::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Operand::List),
            Json::Object(map) if is_wrapper(map) => match &map["value"] {
                Json::Array(_) => Operand::from_json(&map["value"]),
                inner => Expr::from_json(inner).map(Operand::Single),
            },
            other => Expr::from_json(other).map(Operand::Single),
        }
    }
}

/// `{"value": ...}` with no expression keys beside it
fn is_wrapper(map: &Map<String, Json>) -> bool {
    map.contains_key("value")
        && !map.contains_key("escapedValue")
        && !map.contains_key("op")
        && !map.contains_key("name")
}

impl Rule {
    pub fn from_json(value: &Json) -> Result<Rule> {
        let map = value.as_object().ok_or_else(|| {
            RuleError::MalformedExpression(format!("rule must be a JSON object, got {value}"))
        })?;
        let kind = map
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| RuleError::MissingRuleField {
                kind: "<unnamed>".into(),
                field: "name".into(),
            })?;

        if !is_known_kind(kind) {
            return Ok(Rule::Unknown {
                kind: kind.to_string(),
            });
        }

        // an undecodable field is an error only when the kind requires it
        let mut args = RuleArgs::new(kind);
        let mut undecoded = Vec::new();
        for (key, field) in map {
            if key == "name" || field.is_null() {
                continue;
            }
            match Operand::from_json(field) {
                Ok(operand) => {
                    args.insert(key.clone(), operand);
                }
                Err(err) => {
                    log::trace!("{kind} rule: skipping field '{key}': {err}");
                    undecoded.push((key.as_str(), err));
                }
            }
        }

        Rule::from_args(args).map_err(|err| {
            let cause = match &err {
                RuleError::MissingRuleField { field, .. } => {
                    undecoded.iter().position(|(key, _)| *key == field.as_str())
                }
                _ => None,
            };
            match cause {
                Some(i) => undecoded.swap_remove(i).1,
                None => err,
            }
        })
    }

    pub fn from_json_str(s: &str) -> Result<Rule> {
        let value: Json = serde_json::from_str(s)?;
        Rule::from_json(&value)
    }
}

// ============ Encoding ============

impl From<&Literal> for Json {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Ident(name) => json!({ "value": name }),
            Literal::String(s) => json!({ "value": lit.to_string(), "escapedValue": s }),
            Literal::Regex(_) => json!({ "value": lit.to_string() }),
            Literal::Int(n) => json!({ "value": n }),
            Literal::Float(n) => json!({ "value": n }),
            Literal::Bool(b) => json!({ "value": b }),
        }
    }
}

impl From<&Expr> for Json {
    fn from(expr: &Expr) -> Self {
        match expr {
            Expr::Literal(lit) => Json::from(lit),
            Expr::BinaryOp { left, op, right } => json!({
                "op": op,
                "left": Json::from(left.as_ref()),
                "right": Json::from(right.as_ref()),
            }),
            Expr::Call { name, args } => json!({
                "name": name,
                "args": args.iter().map(Json::from).collect::<Vec<_>>(),
            }),
        }
    }
}

impl From<&Operand> for Json {
    fn from(operand: &Operand) -> Self {
        match operand {
            Operand::Single(expr) => Json::from(expr),
            Operand::List(items) => json!({
                "value": items.iter().map(Json::from).collect::<Vec<_>>(),
            }),
        }
    }
}

impl Rule {
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert("name".into(), json!(self.kind()));

        let mut put = |key: &str, value: Json| {
            map.insert(key.to_string(), value);
        };
        match self {
            Rule::Create { with } => put("with", json!(with)),
            Rule::Header { rownum } => put("rownum", json!(rownum)),
            Rule::Keep { row } | Rule::Delete { row } => put("row", Json::from(row)),
            Rule::Rename { col, to } => {
                put("col", Json::from(col));
                put("to", Json::from(to));
            }
            Rule::Nest { col, into } => {
                put("col", Json::from(col));
                put("into", json!(into));
            }
            Rule::Unnest { col } | Rule::Flatten { col } => put("col", Json::from(col)),
            Rule::SetType { col, ty } => {
                put("col", Json::from(col));
                put("type", json!(ty));
            }
            Rule::SetFormat { col, format } => {
                put("col", Json::from(col));
                put("format", json!(format));
            }
            Rule::Derive { value, alias } => {
                put("value", Json::from(value));
                put("as", json!(alias));
            }
            Rule::Set { col, value } => {
                put("col", Json::from(col));
                put("value", Json::from(value));
            }
            Rule::Split { col, on, limit } => {
                put("col", Json::from(col));
                put("on", Json::from(on));
                put("limit", json!(limit));
            }
            Rule::Extract { col, on, limit } => {
                put("col", Json::from(col));
                put("on", Json::from(on));
                put("limit", json!(limit.get()));
            }
            Rule::CountPattern { col, on } => {
                put("col", Json::from(col));
                put("on", Json::from(on));
            }
            Rule::Sort { order, direction } => {
                put("order", Json::from(order));
                let ty = direction.as_str().to_lowercase();
                put("type", json!({ "value": format!("'{ty}'"), "escapedValue": ty }));
            }
            Rule::Replace { col, on, with } => {
                put("col", Json::from(col));
                put("on", Json::from(on));
                put("with", Json::from(with));
            }
            Rule::Merge { col, with } => {
                put("col", Json::from(col));
                put("with", json!(with));
            }
            Rule::Aggregate { value, group } => {
                put("value", Json::from(value));
                put("group", Json::from(group));
            }
            Rule::Move { col, target } => {
                put("col", Json::from(col));
                match target {
                    MoveTarget::Before(before) => put("before", json!(before)),
                    MoveTarget::After(after) => put("after", json!(after)),
                }
            }
            Rule::Unknown { .. } => {}
        }
        Json::Object(map)
    }
}
