use std::sync::OnceLock;

use regex::Regex;

use crate::core::{
    utils::uses_word_boundaries,
    Morph,
    MorphRankError,
};

fn html_tag_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"<[^>]*>").expect("invalid built-in regex"))
}

fn morph_status(morph: &Morph, known_interval_threshold: u32) -> &'static str {
    match morph.highest_learning_interval.unwrap_or(0) {
        0 => "unknown",
        interval if interval < known_interval_threshold => "learning",
        _ => "known",
    }
}

fn morph_regex(inflection: &str) -> Result<Regex, MorphRankError> {
    let escaped = regex::escape(inflection);
    let pattern = if uses_word_boundaries(inflection) {
        format!(r"(?i)\b{}\b", escaped)
    } else {
        format!("(?i){}", escaped)
    };
    Ok(Regex::new(&pattern)?)
}

struct Span {
    start: usize,
    end: usize,
    status: &'static str,
}

fn highlight_segment(segment: &str, matchers: &[(Regex, &'static str)]) -> String {
    let mut spans: Vec<Span> = Vec::new();

    for (regex, status) in matchers {
        for found in regex.find_iter(segment) {
            let overlaps =
                spans.iter().any(|span| found.start() < span.end && span.start < found.end());
            if !overlaps {
                spans.push(Span { start: found.start(), end: found.end(), status: *status });
            }
        }
    }
    spans.sort_by_key(|span| span.start);

    let mut highlighted = String::with_capacity(segment.len());
    let mut cursor = 0;
    for span in spans {
        highlighted.push_str(&segment[cursor..span.start]);
        highlighted.push_str(&format!(
            "<span morph-status=\"{}\">{}</span>",
            span.status,
            &segment[span.start..span.end]
        ));
        cursor = span.end;
    }
    highlighted.push_str(&segment[cursor..]);
    highlighted
}

/// Wraps every occurrence of the card's morphs in `text` with a status span.
///
/// Matching is case-insensitive, never looks inside HTML tags, and prefers the
/// longest morph when occurrences overlap.
pub fn highlight_text(
    morphs: &[Morph],
    text: &str,
    known_interval_threshold: u32,
) -> Result<String, MorphRankError> {
    let mut ordered: Vec<&Morph> = morphs.iter().filter(|m| !m.inflection().is_empty()).collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.inflection().chars().count()));

    let matchers = ordered
        .into_iter()
        .map(|morph| {
            Ok((morph_regex(morph.inflection())?, morph_status(morph, known_interval_threshold)))
        })
        .collect::<Result<Vec<_>, MorphRankError>>()?;

    let mut highlighted = String::with_capacity(text.len() * 2);
    let mut cursor = 0;
    for tag in html_tag_regex().find_iter(text) {
        highlighted.push_str(&highlight_segment(&text[cursor..tag.start()], &matchers));
        highlighted.push_str(tag.as_str());
        cursor = tag.end();
    }
    highlighted.push_str(&highlight_segment(&text[cursor..], &matchers));

    Ok(highlighted)
}
