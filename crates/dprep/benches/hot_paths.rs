use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dprep::{Rule, parse_rule, short_rule_string, summarize, tokenize};

fn wide_line() -> String {
    (0..200)
        .map(|i| {
            if i % 3 == 0 {
                format!("\"field, {i} \"\"quoted\"\"\"")
            } else {
                format!("field{i}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn bench_tokenize(c: &mut Criterion) {
    let line = wide_line();

    c.bench_function("tokenize_wide_line", |b| {
        b.iter(|| tokenize(black_box(&line), black_box(","), black_box("\"")))
    });
}

fn bench_parse_rule(c: &mut Criterion) {
    let text = "keep row: length(name) > 3 && gold >= 100 || isnull(city)";

    c.bench_function("parse_rule", |b| {
        b.iter(|| parse_rule(black_box(text)).unwrap())
    });
}

fn bench_summaries(c: &mut Criterion) {
    let rule = parse_rule("aggregate value: sum(a), avg(b), count() group: c, d, e").unwrap();
    let json = rule.to_json().to_string();

    c.bench_function("summarize_rule", |b| {
        b.iter(|| summarize(black_box(&rule)))
    });

    c.bench_function("short_rule_string_from_json", |b| {
        b.iter(|| short_rule_string(black_box(&json)).unwrap())
    });

    c.bench_function("rule_from_json", |b| {
        b.iter(|| Rule::from_json_str(black_box(&json)).unwrap())
    });
}

criterion_group!(hot_paths, bench_tokenize, bench_parse_rule, bench_summaries);
criterion_main!(hot_paths);
