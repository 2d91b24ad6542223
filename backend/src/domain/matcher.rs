//! Tokenizer and sequence matcher.
//!
//! Messages are normalised into the exact string that will be delivered
//! (lower-cased, then escaped for the rich-text sink) before matching, so
//! every reported offset can be fed straight to [`crate::domain::obfuscate`].
//! Offsets are character indices, not byte indices.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::markdown;
use super::pattern::{MatchingMode, Pattern};

static LINK_RE: OnceLock<Regex> = OnceLock::new();

fn link_regex() -> &'static Regex {
    LINK_RE.get_or_init(|| {
        // Scheme, colon-slashes, then everything up to the next whitespace.
        Regex::new(r"[a-z][a-z0-9+.\-]*://\S+")
            .unwrap_or_else(|error| panic!("link regex failed to compile: {error}"))
    })
}

/// Outcome of searching a message for the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The pattern is not hidden in the message.
    NoMatch,
    /// One strictly increasing character offset per pattern letter.
    Matched(Vec<usize>),
}

impl MatchResult {
    /// Apply the adjacency rule to a complete set of candidate offsets.
    ///
    /// Two consecutive hits exactly one character apart mean the pattern was
    /// typed as a run rather than hidden, so the candidate is discarded.
    fn from_candidates(positions: Vec<usize>) -> Self {
        let adjacent = positions
            .windows(2)
            .any(|pair| matches!(pair, [left, right] if left + 1 == *right));
        if positions.is_empty() || adjacent {
            Self::NoMatch
        } else {
            Self::Matched(positions)
        }
    }

    /// Matched offsets, if any.
    pub fn positions(&self) -> Option<&[usize]> {
        match self {
            Self::NoMatch => None,
            Self::Matched(positions) => Some(positions),
        }
    }

    /// Whether the pattern was found.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Message text in its delivered form, with link spans precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    chars: Vec<char>,
    links: Vec<Range<usize>>,
}

impl DisplayText {
    /// Lower-case and escape `raw`, then locate links.
    ///
    /// # Examples
    /// ```
    /// use acrostic::domain::DisplayText;
    ///
    /// let text = DisplayText::normalize("Hi (Bob)!");
    /// assert_eq!(text.to_string(), "hi \\(bob\\)\\!");
    /// ```
    pub fn normalize(raw: &str) -> Self {
        let escaped = markdown::escape(&raw.to_lowercase());
        let links = link_regex()
            .find_iter(&escaped)
            .map(|found| {
                let start = escaped
                    .get(..found.start())
                    .map_or(0, |prefix| prefix.chars().count());
                start..start + found.as_str().chars().count()
            })
            .collect();
        Self {
            chars: escaped.chars().collect(),
            links,
        }
    }

    /// Characters of the delivered text.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the text has no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn link_starting_at(&self, index: usize) -> Option<&Range<usize>> {
        self.links.iter().find(|span| span.start == index)
    }

    fn is_link_token(&self, token: &Range<usize>) -> bool {
        self.links.iter().any(|span| token.contains(&span.start))
    }

    /// First occurrence of `letter` at or after `begin`, skipping links.
    fn find_from(&self, letter: char, begin: usize) -> Option<usize> {
        let mut index = begin;
        while let Some(&ch) = self.chars.get(index) {
            if let Some(span) = self.link_starting_at(index) {
                index = span.end;
                continue;
            }
            if ch == letter {
                return Some(index);
            }
            index += 1;
        }
        None
    }

    fn tokens(&self) -> Vec<Range<usize>> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (index, ch) in self.chars.iter().enumerate() {
            match (ch.is_whitespace(), start) {
                (true, Some(open)) => {
                    tokens.push(open..index);
                    start = None;
                }
                (false, None) => start = Some(index),
                _ => {}
            }
        }
        if let Some(open) = start {
            tokens.push(open..self.chars.len());
        }
        tokens
    }
}

impl std::fmt::Display for DisplayText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.chars.iter().try_for_each(|ch| write!(f, "{ch}"))
    }
}

/// Greedy leftmost scan: each letter is the first occurrence after the
/// previous hit. No backtracking.
pub fn match_letters(letters: &[char], text: &DisplayText) -> MatchResult {
    let mut positions = Vec::with_capacity(letters.len());
    let mut begin = 0;
    for &letter in letters {
        let Some(found) = text.find_from(letter, begin) else {
            return MatchResult::NoMatch;
        };
        positions.push(found);
        begin = found + 1;
    }
    MatchResult::from_candidates(positions)
}

/// Letters must open consecutive tokens. A token that breaks the sequence
/// restarts it; link tokens always break it.
pub fn match_token_initials(letters: &[char], text: &DisplayText) -> MatchResult {
    let mut positions: Vec<usize> = Vec::with_capacity(letters.len());
    for token in text.tokens() {
        if letters.is_empty() || positions.len() == letters.len() {
            break;
        }
        if text.is_link_token(&token) {
            positions.clear();
            continue;
        }
        let first = text.chars.get(token.start).copied();
        if first.is_some() && first == letters.get(positions.len()).copied() {
            positions.push(token.start);
            continue;
        }
        positions.clear();
        if first.is_some() && first == letters.first().copied() {
            positions.push(token.start);
        }
    }

    if positions.len() == letters.len() {
        MatchResult::from_candidates(positions)
    } else {
        MatchResult::NoMatch
    }
}

/// Result of scanning one message: the delivered text and where the
/// pattern sits in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Normalised, escaped message text.
    pub text: DisplayText,
    /// Match outcome over `text`.
    pub result: MatchResult,
}

/// Matcher bound to the process-wide pattern and mode.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    pattern: Pattern,
    mode: MatchingMode,
}

impl SequenceMatcher {
    /// Bind a matcher to `pattern` using `mode`.
    pub fn new(pattern: Pattern, mode: MatchingMode) -> Self {
        Self { pattern, mode }
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The configured mode.
    pub fn mode(&self) -> MatchingMode {
        self.mode
    }

    /// Search already-normalised text.
    pub fn find(&self, text: &DisplayText) -> MatchResult {
        match self.mode {
            MatchingMode::LetterScan => match_letters(self.pattern.letters(), text),
            MatchingMode::TokenInitial => match_token_initials(self.pattern.letters(), text),
        }
    }

    /// Normalise `raw` and search it.
    ///
    /// # Examples
    /// ```
    /// use acrostic::domain::{MatchResult, MatchingMode, Pattern, SequenceMatcher};
    ///
    /// let matcher = SequenceMatcher::new(
    ///     Pattern::new("owl").expect("valid pattern"),
    ///     MatchingMode::TokenInitial,
    /// );
    /// let scan = matcher.scan("orange was lovely");
    /// assert_eq!(scan.result, MatchResult::Matched(vec![0, 7, 11]));
    /// ```
    pub fn scan(&self, raw: &str) -> Scan {
        let text = DisplayText::normalize(raw);
        let result = self.find(&text);
        Scan { text, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn letters(raw: &str) -> Vec<char> {
        raw.chars().collect()
    }

    #[fixture]
    fn owl() -> Pattern {
        Pattern::new("owl").expect("valid pattern")
    }

    #[rstest]
    #[case(MatchingMode::LetterScan)]
    #[case(MatchingMode::TokenInitial)]
    fn finds_acrostic_at_token_starts(owl: Pattern, #[case] mode: MatchingMode) {
        let scan = SequenceMatcher::new(owl, mode).scan("Orange Was Lovely");
        assert_eq!(scan.result, MatchResult::Matched(vec![0, 7, 11]));
    }

    #[rstest]
    #[case("owl")]
    #[case("a bowl of soup")]
    #[case("howling")]
    fn letter_scan_rejects_contiguous_runs(owl: Pattern, #[case] text: &str) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::LetterScan);
        assert_eq!(matcher.scan(text).result, MatchResult::NoMatch);
    }

    #[rstest]
    fn contiguous_word_in_single_token_never_matches() {
        let cat = Pattern::new("cat").expect("valid pattern");
        for mode in [MatchingMode::LetterScan, MatchingMode::TokenInitial] {
            let matcher = SequenceMatcher::new(cat.clone(), mode);
            assert_eq!(matcher.scan("cats").result, MatchResult::NoMatch);
        }
    }

    #[rstest]
    fn letter_scan_is_greedy_and_does_not_backtrack(owl: Pattern) {
        // The first `o` sits after the only `w`.
        let matcher = SequenceMatcher::new(owl, MatchingMode::LetterScan);
        assert_eq!(matcher.scan("a wood").result, MatchResult::NoMatch);
        assert_eq!(
            matcher.scan("one wet log").result,
            MatchResult::Matched(vec![0, 4, 8])
        );
    }

    #[rstest]
    fn letter_scan_skips_links(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::LetterScan);
        assert_eq!(
            matcher.scan("odd https://www.example.com lovely").result,
            MatchResult::NoMatch
        );
        assert_eq!(
            matcher.scan("other https://x.io wild lake").result,
            MatchResult::Matched(vec![0, 20, 22])
        );
    }

    #[rstest]
    fn offsets_index_the_escaped_text(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::LetterScan);
        let scan = matcher.scan("(o) was lovely");
        assert_eq!(scan.text.to_string(), "\\(o\\) was lovely");
        assert_eq!(scan.result, MatchResult::Matched(vec![2, 6, 10]));
    }

    #[rstest]
    fn token_initial_restarts_on_broken_sequence(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::TokenInitial);
        assert_eq!(
            matcher.scan("old wolf oak wide lake").result,
            MatchResult::Matched(vec![9, 13, 18])
        );
    }

    #[rstest]
    fn token_initial_uses_real_offsets_across_runs_of_spaces(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::TokenInitial);
        assert_eq!(
            matcher.scan("orange   was\tlovely").result,
            MatchResult::Matched(vec![0, 9, 13])
        );
    }

    #[rstest]
    fn token_initial_keeps_first_complete_match(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::TokenInitial);
        assert_eq!(
            matcher.scan("orange was lovely oh wow lol").result,
            MatchResult::Matched(vec![0, 7, 11])
        );
    }

    #[rstest]
    fn token_initial_link_breaks_sequence(owl: Pattern) {
        let matcher = SequenceMatcher::new(owl, MatchingMode::TokenInitial);
        assert_eq!(
            matcher.scan("orange wow https://lol.example").result,
            MatchResult::NoMatch
        );
    }

    #[rstest]
    fn empty_pattern_never_matches() {
        let text = DisplayText::normalize("anything at all");
        assert_eq!(match_letters(&[], &text), MatchResult::NoMatch);
        assert_eq!(match_token_initials(&[], &text), MatchResult::NoMatch);
    }

    #[rstest]
    fn matches_satisfy_position_invariants() {
        let samples = [
            "orange was lovely",
            "only when little owls wake, lanterns glow",
            "o w l",
            "ooo www lll",
            "https://owl.example o x w y l",
            "🦉 olive 🦉 wine 🦉 lime",
            "",
        ];
        for pattern in ["owl", "ol", "wow", "o"] {
            for sample in samples {
                let text = DisplayText::normalize(sample);
                for result in [
                    match_letters(&letters(pattern), &text),
                    match_token_initials(&letters(pattern), &text),
                ] {
                    if let MatchResult::Matched(positions) = result {
                        assert_eq!(positions.len(), pattern.chars().count());
                        assert!(positions.windows(2).all(|pair| pair[0] + 1 < pair[1]));
                        assert!(positions.iter().all(|&p| p < text.len()));
                    }
                }
            }
        }
    }
}
