//! Black-box integration tests for dprep
//!
//! These tests exercise the text -> rule -> summary and JSON paths.

use std::io::Write;

use dprep::{
    Expr, Grid, Literal, MoveTarget, Operand, PrepError, Rule, RuleError, SortOrder,
    SplitOptions, advanced, create_json_rule_string, create_rule_string, json_rule_string, load_grid,
    parse_rule, short_rule_string, short_rule_summary, summarize, tokenize, upstream_ds_id,
};
use serde_json::json;

fn summary(text: &str) -> String {
    short_rule_summary(text).unwrap_or_else(|e| panic!("{text}: {e}"))
}

fn json_summary(value: serde_json::Value) -> String {
    short_rule_string(&value.to_string()).unwrap()
}

// ============ Summaries from rule text ============

#[test]
fn create() {
    assert_eq!(summary("create with: ds_1234"), "create with: ds_1234");
}

#[test]
fn header() {
    assert_eq!(summary("header rownum: 2"), "Convert row 2 to header");
}

#[test]
fn keep_and_delete() {
    assert_eq!(
        summary("keep row: gold > 100 && type == 'merchant'"),
        "Keep rows where gold > 100 && type == 'merchant'"
    );
    assert_eq!(
        summary("delete row: isnull(name)"),
        "Delete rows where isnull(name)"
    );
}

#[test]
fn rename() {
    assert_eq!(summary("rename col: a to: 'b'"), "Rename a to 'b'");
    assert_eq!(
        summary("rename col: a, b to: 'x', 'y'"),
        "Rename a, b to 'x', 'y'"
    );
    assert_eq!(
        summary("rename col: a, b, c to: 'x', 'y', 'z'"),
        "Rename 3 columns"
    );
}

#[test]
fn nest_and_unnest() {
    assert_eq!(
        summary("nest col: a, b into: map as: 'm'"),
        "Convert a, b into map"
    );
    assert_eq!(
        summary("unnest col: m into: map idx: 'a'"),
        "Create a new column from m"
    );
}

#[test]
fn settype_and_setformat() {
    assert_eq!(summary("settype col: a type: long"), "set type a to long");
    assert_eq!(
        summary("settype col: a, b, c, d type: double"),
        "set type 4 columns to double"
    );
    assert_eq!(
        summary("setformat col: d format: 'yyyy-MM-dd'"),
        "set format d to yyyy-MM-dd"
    );
}

#[test]
fn derive_and_set() {
    assert_eq!(
        summary("derive value: price * qty as: 'total'"),
        "Create total from price * qty"
    );
    assert_eq!(
        summary("set col: a, b value: upper(a)"),
        "Set a, b to upper(a)"
    );
}

#[test]
fn split_and_extract() {
    assert_eq!(
        summary("split col: tags on: ',' limit: 2"),
        "Split tags into 3 columns on ','"
    );
    assert_eq!(
        summary("split col: tags on: ',' limit: 0"),
        "Split tags into 1 column on ','"
    );
    assert_eq!(
        summary("extract col: phone on: /[0-9]+/ limit: 1"),
        "Extract /[0-9]+/ 1 time from phone"
    );
    assert_eq!(
        summary("extract col: phone on: /[0-9]+/ limit: 4"),
        "Extract /[0-9]+/ 4 times from phone"
    );
}

#[test]
fn flatten_and_countpattern() {
    assert_eq!(summary("flatten col: arr"), "Convert arrays in arr to rows");
    assert_eq!(
        summary("countpattern col: a, b, c on: 'x'"),
        "Count occurrences of 'x' in 3 columns"
    );
}

#[test]
fn sort() {
    assert_eq!(summary("sort order: a, b"), "Sort rows by a, b ASC");
    assert_eq!(summary("sort order: a type: 'desc'"), "Sort rows by a DESC");
    assert_eq!(summary("sort order: a type: 'DeSc'"), "Sort rows by a DESC");
    assert_eq!(summary("sort order: a type: 'asc'"), "Sort rows by a ASC");
}

#[test]
fn replace() {
    assert_eq!(
        summary("replace col: a on: 'x' with: 'y'"),
        "Replace 'x' from a with 'y'"
    );
    assert_eq!(
        summary("replace col: a, b, c on: 'x' with: 'y'"),
        "Replace 3 columns"
    );
}

#[test]
fn merge_and_aggregate() {
    assert_eq!(
        summary("merge col: a, b, c with: '-' as: 'abc'"),
        "Concatenate a, b, c separated by -"
    );
    assert_eq!(
        summary("aggregate value: sum(gold), count() group: city, year"),
        "Aggregate with sum(gold), count() grouped by city, year"
    );
    assert_eq!(
        summary("aggregate value: avg(x) group: a, b, c"),
        "Aggregate with avg(x) grouped by 3 columns"
    );
}

#[test]
fn move_rule() {
    assert_eq!(summary("move col: a before: b"), "Move a before b");
    assert_eq!(summary("move col: a, b, c after: z"), "Move 3 columns after z");
    // before wins when both are present
    assert_eq!(summary("move col: a before: b after: c"), "Move a before b");
}

#[test]
fn unknown_kinds_fall_back() {
    assert_eq!(summary("pivot col: a value: sum(b)"), "pivot unknown");
    assert_eq!(summary("union dataset2: ds2"), "union unknown");
    assert_eq!(summary("join dataset2: ds2"), "join unknown");
}

// ============ Errors ============

#[test]
fn missing_field_is_reported() {
    let err = short_rule_summary("rename col: a").unwrap_err();
    match err {
        PrepError::Rule(RuleError::MissingRuleField { kind, field }) => {
            assert_eq!(kind, "rename");
            assert_eq!(field, "to");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn move_without_target_is_missing_field() {
    let err = parse_rule("move col: a").unwrap_err();
    assert!(matches!(
        err,
        PrepError::Rule(RuleError::MissingRuleField { .. })
    ));
}

#[test]
fn list_valued_row() {
    assert_eq!(summary("keep row: a, b"), "Keep rows where a, b");
    assert_eq!(
        summary("derive value: a, b as: 'pair'"),
        "Create pair from a, b"
    );
}

#[test]
fn invalid_field_shapes() {
    assert!(matches!(
        parse_rule("header rownum: abc"),
        Err(PrepError::Rule(RuleError::InvalidRuleField { .. }))
    ));
    assert!(matches!(
        parse_rule("split col: a on: ',' limit: -1"),
        Err(PrepError::Rule(RuleError::InvalidRuleField { .. }))
    ));
    assert!(matches!(
        parse_rule("extract col: a on: ',' limit: 0"),
        Err(PrepError::Rule(RuleError::InvalidRuleField { .. }))
    ));
}

#[test]
fn syntax_error_is_parse_error() {
    let err = parse_rule("keep row: (a > 1").unwrap_err();
    assert!(matches!(err, PrepError::Parse(_)), "{err}");
    assert!(err.to_string().starts_with("Parse error:"));
}

// ============ JSON ============

#[test]
fn json_header() {
    assert_eq!(
        json_summary(json!({ "name": "header", "rownum": 2 })),
        "Convert row 2 to header"
    );
}

#[test]
fn json_wrapped_column_lists() {
    let rule = json!({
        "name": "settype",
        "col": { "value": ["a", "b", "c"] },
        "type": "long",
    });
    assert_eq!(json_summary(rule), "set type 3 columns to long");

    let rule = json!({
        "name": "rename",
        "col": { "value": ["a", "b"] },
        "to": { "value": ["'x'", "'y'"] },
    });
    assert_eq!(json_summary(rule), "Rename a, b to 'x', 'y'");
}

#[test]
fn json_sort_type() {
    let desc = json!({
        "name": "sort",
        "order": { "value": "gold" },
        "type": { "value": "'desc'", "escapedValue": "desc" },
    });
    assert_eq!(json_summary(desc), "Sort rows by gold DESC");

    let asc = json!({ "name": "sort", "order": { "value": "gold" } });
    assert_eq!(json_summary(asc), "Sort rows by gold ASC");
}

#[test]
fn json_keep_expression() {
    let rule = json!({
        "name": "keep",
        "row": {
            "op": "&&",
            "left": { "op": ">", "left": { "value": "gold" }, "right": { "value": 100 } },
            "right": { "name": "isnull", "args": [{ "value": "name" }] },
        },
    });
    assert_eq!(json_summary(rule), "Keep rows where gold > 100 && isnull(name)");
}

#[test]
fn json_call_without_args_is_malformed() {
    let rule = json!({
        "name": "derive",
        "value": { "name": "now" },
        "as": "ts",
    });
    let err = short_rule_string(&rule.to_string()).unwrap_err();
    assert!(matches!(
        err,
        PrepError::Rule(RuleError::MalformedExpression(_))
    ));
}

#[test]
fn json_extra_fields_are_ignored() {
    assert_eq!(
        json_summary(json!({ "name": "header", "rownum": 2, "meta": {} })),
        "Convert row 2 to header"
    );

    let rule = json!({
        "name": "rename",
        "col": { "value": ["a", "b"] },
        "to": { "value": ["'x'", "'y'"] },
        "extra": [null],
        "settings": { "ui": { "collapsed": true } },
    });
    assert_eq!(json_summary(rule), "Rename a, b to 'x', 'y'");
}

#[test]
fn json_bad_required_field_is_still_reported() {
    let rule = json!({ "name": "keep", "row": {}, "meta": {} });
    let err = short_rule_string(&rule.to_string()).unwrap_err();
    assert!(matches!(
        err,
        PrepError::Rule(RuleError::MalformedExpression(_))
    ));
}

#[test]
fn json_list_valued_expressions() {
    assert_eq!(
        json_summary(json!({ "name": "keep", "row": { "value": ["a", "b"] } })),
        "Keep rows where a, b"
    );
    assert_eq!(
        json_summary(json!({
            "name": "set",
            "col": { "value": ["a"] },
            "value": { "value": ["x", "y"] },
        })),
        "Set a to x, y"
    );
}

#[test]
fn json_unknown_kind() {
    assert_eq!(
        json_summary(json!({ "name": "pivot", "col": "a" })),
        "pivot unknown"
    );
}

#[test]
fn json_invalid_text() {
    let err = short_rule_string("{not json").unwrap_err();
    assert!(matches!(err, PrepError::Rule(RuleError::Json(_))));
}

#[test]
fn rule_text_to_json_and_back() {
    let texts = [
        "header rownum: 1",
        "keep row: length(name) > 3",
        "rename col: a, b to: 'x', 'y'",
        "nest col: a, b into: map",
        "unnest col: m",
        "settype col: a, b, c type: long",
        "setformat col: d format: 'yyyy'",
        "derive value: a + b as: 'c'",
        "delete row: a == 'x'",
        "set col: a value: a * 2",
        "split col: a on: ',' limit: 2",
        "extract col: a on: /x/ limit: 2",
        "flatten col: arr",
        "countpattern col: a on: 'x'",
        "sort order: a type: 'desc'",
        "replace col: a on: /[ ]+/ with: ''",
        "merge col: a, b with: '-'",
        "aggregate value: sum(a), count() group: b",
        "move col: a after: b",
    ];
    for text in texts {
        let rule = parse_rule(text).unwrap();
        let json = json_rule_string(text).unwrap();
        let decoded = Rule::from_json_str(&json).unwrap();
        assert_eq!(decoded, rule, "JSON round trip changed {text}: {json}");
        assert_eq!(short_rule_string(&json).unwrap(), summarize(&rule));
    }
}

// ============ Create shorthand ============

#[test]
fn create_shorthand_helpers() {
    let text = create_rule_string("ds-42");
    assert_eq!(text, "create with: ds-42");
    assert_eq!(upstream_ds_id(&text), Some("ds-42"));
    assert_eq!(upstream_ds_id("header rownum: 1"), None);

    let json = create_json_rule_string(&text).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, json!({ "name": "create", "with": "ds-42" }));
    assert_eq!(create_json_rule_string("keep row: a"), None);
}

#[test]
fn create_shorthand_bypasses_parser() {
    // not valid rule syntax, but the prefix short-circuits parsing
    let rule = parse_rule("create with: my dataset (v2)").unwrap();
    assert_eq!(
        rule,
        Rule::Create {
            with: "my dataset (v2)".into()
        }
    );
}

// ============ Direct construction ============

#[test]
fn summaries_are_stable() {
    let rule = Rule::Sort {
        order: Operand::columns(["a", "b", "c"]),
        direction: SortOrder::Asc,
    };
    assert_eq!(summarize(&rule), summarize(&rule));
    assert_eq!(summarize(&rule), "Sort rows by a, b, c ASC");
}

#[test]
fn move_target_from_code() {
    let rule = Rule::Move {
        col: Operand::Single(Expr::Literal(Literal::Ident("a".into()))),
        target: MoveTarget::Before("b".into()),
    };
    assert_eq!(rule.summary(), "Move a before b");
}

// ============ Tokenizer and grids ============

#[test]
fn tokenize_quoted_delimiters() {
    assert_eq!(
        tokenize(r#"a,"b,c",d"#, ",", "\""),
        vec!["a", "b,c", "d"]
    );
    assert!(tokenize("", ",", "\"").is_empty());
}

#[test]
fn load_grid_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "id|name").unwrap();
    writeln!(file, "1|'Smith| John'").unwrap();
    writeln!(file, "2|'O''Brien'").unwrap();
    writeln!(file, "3|Doe").unwrap();

    let options = SplitOptions::default()
        .with_delimiter("|")
        .with_quote("'")
        .with_limit(2);
    let grid = load_grid(file.path(), &options).unwrap();

    assert_eq!(grid.columns, vec!["id", "name"]);
    assert_eq!(
        grid.rows,
        vec![vec!["1", "Smith| John"], vec!["2", "O'Brien"]]
    );
}

#[test]
fn load_grid_crlf_lines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "a,b\r\n1,2\r\n").unwrap();

    let grid = load_grid(file.path(), &SplitOptions::default()).unwrap();
    assert_eq!(grid.columns, vec!["a", "b"]);
    assert_eq!(grid.rows, vec![vec!["1", "2"]]);
}

#[test]
fn load_grid_missing_file() {
    let err = load_grid(
        std::path::Path::new("/definitely/not/here.csv"),
        &SplitOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("here.csv"));
}

#[test]
fn grid_from_lines_matches_file() {
    let lines = ["x,y", "1,2"];
    let grid = Grid::from_lines(lines, &SplitOptions::default());
    assert_eq!(grid.width(), 2);
    assert_eq!(grid.rows[0], vec!["1", "2"]);
}

// ============ Low-level arguments ============

#[test]
fn raw_arguments_build_rules() {
    let args = advanced::parse_args("merge col: a, b with: '-' as: 'ab'").unwrap();
    assert_eq!(args.kind, "merge");
    assert!(args.contains("with"));
    assert!(args.contains("as"));
    assert!(!args.contains("on"));

    let rule = Rule::from_args(args).unwrap();
    assert_eq!(summarize(&rule), "Concatenate a, b separated by -");
}
