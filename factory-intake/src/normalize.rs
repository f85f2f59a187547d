//! Text normalization for capability descriptions and request statements.
//!
//! [`normalize`] lowercases text, splits it on non-alphanumeric boundaries,
//! drops stop words and single-character tokens, and folds common English
//! suffixes so that inflected forms share a stem (`automated` and
//! `automatically` both become `automat`).

use std::collections::HashSet;
use std::sync::LazyLock;

/// Minimum token length in characters; shorter tokens are discarded.
pub const MIN_TOKEN_CHARS: usize = 2;

/// A stemmed token must keep at least this many characters, otherwise the
/// suffix is left in place.
const MIN_STEM_CHARS: usize = 3;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
        "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
        "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
        "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
        "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more",
        "most", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
        "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
        "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this",
        "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
        "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
        "you", "your", "yours",
    ]
    .into_iter()
    .collect()
});

/// Suffix rewrite rules, tried in order. The first matching rule wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ically", ""),
    ("ations", "at"),
    ("ation", "at"),
    ("ating", "at"),
    ("ated", "at"),
    ("ates", "at"),
    ("ate", "at"),
    ("ions", ""),
    ("ion", ""),
    ("ings", ""),
    ("ing", ""),
    ("edly", ""),
    ("ed", ""),
    ("ly", ""),
    ("ies", "y"),
    ("sses", "ss"),
];

/// Returns `true` if `token` is in the fixed stop-word set.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Tokenize and normalize `text`.
///
/// Identical input always yields identical output. Empty or punctuation-only
/// text yields an empty vector.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(token))
        .map(stem)
        .collect()
}

/// Fold a lowercase token onto its stem.
pub fn stem(token: &str) -> String {
    for (suffix, replacement) in SUFFIX_RULES {
        if let Some(base) = token.strip_suffix(suffix) {
            if base.chars().count() >= MIN_STEM_CHARS {
                return format!("{base}{replacement}");
            }
            return token.to_string();
        }
    }

    // Plural `s`, except for `ss`, `us` and `is` endings.
    if let Some(base) = token.strip_suffix('s') {
        let keeps = base.ends_with('s') || base.ends_with('u') || base.ends_with('i');
        if !keeps && base.chars().count() >= MIN_STEM_CHARS {
            return base.to_string();
        }
    }

    token.to_string()
}
