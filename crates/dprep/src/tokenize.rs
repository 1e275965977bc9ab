//! Quote-aware splitting of one line of delimited text
//!
//! Rules applied, in order:
//! 1. The line is split on `delimiter`.
//! 2. Delimiters between an opening and closing `quote` are not boundaries.
//! 3. A field wrapped in exactly one pair of quotes loses them.
//! 4. A doubled quote inside a field becomes a single quote.
//!
//! Quote state flips at every position where `quote` matches, including
//! positions inside a run of quote characters. Three quotes in a row thus
//! leave the state flipped once overall, and a delimiter seen after that
//! point splits the line even if the quoting looked balanced to a human.

/// Split `line` into fields
///
/// An empty line yields no fields, and a delimiter at the very end of the
/// line does not produce a trailing empty field. An empty `quote` disables
/// quote handling; an empty `delimiter` never matches.
pub fn tokenize(line: &str, delimiter: &str, quote: &str) -> Vec<String> {
    let boundaries = find_boundaries(line, delimiter, quote);

    let mut fields = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for idx in boundaries {
        // a match starting inside the previous delimiter, e.g. "::" in ":::"
        if idx < start {
            continue;
        }
        fields.push(clean_field(&line[start..idx], quote));
        start = idx + delimiter.len();
    }
    if start < line.len() {
        fields.push(clean_field(&line[start..], quote));
    }
    fields
}

/// Byte offsets of every unquoted delimiter match
fn find_boundaries(line: &str, delimiter: &str, quote: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    if delimiter.is_empty() {
        return boundaries;
    }

    let mut in_quote = false;
    for (i, _) in line.char_indices() {
        let rest = &line[i..];
        if !quote.is_empty() && rest.starts_with(quote) {
            in_quote = !in_quote;
        } else if !in_quote && rest.starts_with(delimiter) {
            boundaries.push(i);
        }
    }
    boundaries
}

/// Strip one pair of wrapping quotes, then collapse doubled quotes
fn clean_field(raw: &str, quote: &str) -> String {
    if quote.is_empty() {
        return raw.to_string();
    }

    let wrapped = raw != quote
        && raw.len() >= 2 * quote.len()
        && raw.starts_with(quote)
        && raw.ends_with(quote);
    let field = if wrapped {
        &raw[quote.len()..raw.len() - quote.len()]
    } else {
        raw
    };

    let doubled = quote.repeat(2);
    if field.contains(&doubled) {
        field.replace(&doubled, quote)
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(line: &str) -> Vec<String> {
        tokenize(line, ",", "\"")
    }

    #[test]
    fn splits_on_unquoted_delimiters() {
        assert_eq!(csv("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(csv(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn empty_line_has_no_fields() {
        assert!(csv("").is_empty());
    }

    #[test]
    fn trailing_delimiter_drops_final_field() {
        assert_eq!(csv("a,b,"), vec!["a", "b"]);
        assert_eq!(csv(",,"), vec!["", ""]);
        assert_eq!(csv(",a"), vec!["", "a"]);
    }

    #[test]
    fn doubled_quotes_are_unescaped() {
        assert_eq!(csv(r#""he said ""hi""""#), vec![r#"he said "hi""#]);
        assert_eq!(csv(r#"x,"a""b",y"#), vec!["x", r#"a"b"#, "y"]);
    }

    #[test]
    fn lone_quote_is_kept() {
        // a field that is exactly the quote marker is not unwrapped
        assert_eq!(tokenize("a;\"", ";", "\""), vec!["a", "\""]);
        assert_eq!(csv(r#"a,"""#), vec!["a", ""]);
    }

    #[test]
    fn triple_quote_run_flips_state_three_times() {
        // after `"""` the scanner is inside quotes, so the second comma is swallowed
        assert_eq!(csv(r#"a,"""b,c"#), vec!["a", r#"""b,c"#]);
    }

    #[test]
    fn unterminated_quote_absorbs_rest_of_line() {
        assert_eq!(csv(r#"a,"b,c,d"#), vec!["a", r#""b,c,d"#]);
    }

    #[test]
    fn multi_char_delimiter() {
        assert_eq!(tokenize("a||b||c", "||", "\""), vec!["a", "b", "c"]);
        assert_eq!(tokenize(r#"a||"b||c""#, "||", "\""), vec!["a", "b||c"]);
    }

    #[test]
    fn overlapping_delimiter_matches_are_skipped() {
        assert_eq!(tokenize("a:::b", "::", "\""), vec!["a", ":b"]);
    }

    #[test]
    fn multi_char_quote() {
        assert_eq!(tokenize("~~a,b~~,c", ",", "~~"), vec!["a,b", "c"]);
    }

    #[test]
    fn non_ascii_content() {
        assert_eq!(csv("é,\"ü,ß\",ñ"), vec!["é", "ü,ß", "ñ"]);
        assert_eq!(tokenize("a→b→c", "→", "\""), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_markers() {
        assert_eq!(tokenize("a,b", "", "\""), vec!["a,b"]);
        assert_eq!(tokenize(r#""a",b"#, ",", ""), vec![r#""a""#, "b"]);
    }
}
