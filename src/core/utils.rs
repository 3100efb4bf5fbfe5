use std::sync::OnceLock;

use regex::Regex;

use super::{
    config::PreprocessOptions,
    Morph,
};

const CJK_IDEOGRAPH_RANGES: &[(u32, u32)] = &[
    (0x3007, 0x3007),   // Ideographic number zero
    (0x4E00, 0x9FFF),   // CJK Unified Ideographs
    (0x3400, 0x4DBF),   // Extension A
    (0xF900, 0xFAFF),   // Compatibility Ideographs
    (0x20000, 0x2A6DF), // Extension B
    (0x2A700, 0x2B73F), // Extension C
    (0x2B740, 0x2B81F), // Extension D
    (0x2F800, 0x2FA1F), // Compatibility Ideographs Supplement
];

pub fn is_cjk_ideograph(c: char) -> bool {
    let code = c as u32;
    CJK_IDEOGRAPH_RANGES.iter().any(|&(start, end)| start <= code && code <= end)
}

pub fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}')
}

/// Scripts written without spaces between words cannot be matched on word boundaries.
pub fn uses_word_boundaries(text: &str) -> bool {
    !text.chars().any(|c| is_cjk_ideograph(c) || is_kana(c))
}

fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // Patterns are compile-time constants.
    cell.get_or_init(|| Regex::new(pattern).expect("invalid built-in regex"))
}

fn html_tag_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    cached_regex(&CELL, r"<[^>]*>")
}

fn sound_tag_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    cached_regex(&CELL, r"\[sound:[^\]]*\]")
}

fn bracket_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    cached_regex(&CELL, r"\[[^\]]*\]")
}

fn round_bracket_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    cached_regex(&CELL, r"\([^)]*\)")
}

fn slim_round_bracket_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    cached_regex(&CELL, r"（[^）]*）")
}

/// Normalizes card text before it is handed to a morphemizer.
///
/// Text is lower-cased first: some segmentation models label every capitalized word
/// as a proper noun, which is worse than missing the occasional real name.
pub fn process_expression(text: &str, options: &PreprocessOptions) -> String {
    let mut expression = text.to_lowercase();

    expression = sound_tag_regex().replace_all(&expression, "").into_owned();
    expression = html_tag_regex().replace_all(&expression, " ").into_owned();
    expression = expression.replace("&nbsp;", " ");

    if options.ignore_bracket_contents {
        expression = bracket_regex().replace_all(&expression, "").into_owned();
    }
    if options.ignore_round_bracket_contents {
        expression = round_bracket_regex().replace_all(&expression, "").into_owned();
    }
    if options.ignore_slim_round_bracket_contents {
        expression = slim_round_bracket_regex().replace_all(&expression, "").into_owned();
    }

    expression
}

pub fn is_numeric_morph(morph: &Morph) -> bool {
    let inflection = morph.inflection();
    !inflection.is_empty()
        && inflection.chars().all(|c| c.is_numeric() || c == '.' || c == ',')
        && inflection.chars().any(char::is_numeric)
}

/// Filters the raw morphemizer output according to the preprocessing options.
pub fn process_morphs(morphs: Vec<Morph>, options: &PreprocessOptions) -> Vec<Morph> {
    morphs
        .into_iter()
        .filter(|morph| !morph.inflection().trim().is_empty())
        .filter(|morph| !(options.ignore_numbers && is_numeric_morph(morph)))
        .collect()
}
