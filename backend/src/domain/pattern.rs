//! Target pattern and matching mode configuration.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The word or phrase hidden in chat messages.
///
/// ## Invariants
/// - At least one letter.
/// - Letters are lower-case alphanumerics; whitespace in a phrase is kept
///   for display but never searched for.
///
/// # Examples
/// ```
/// use acrostic::domain::Pattern;
///
/// let pattern = Pattern::new("Night Owl").expect("valid pattern");
/// assert_eq!(pattern.letters(), &['n', 'i', 'g', 'h', 't', 'o', 'w', 'l']);
/// assert_eq!(pattern.as_str(), "night owl");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    display: String,
    letters: Vec<char>,
}

/// Validation errors returned by [`Pattern::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternValidationError {
    /// Pattern has no searchable letters.
    #[error("pattern must contain at least one letter")]
    Empty,
    /// Pattern contains a character that cannot be matched or masked safely.
    #[error("pattern character {0:?} is not alphanumeric")]
    UnsupportedCharacter(char),
}

impl Pattern {
    /// Validate and normalise a configured pattern.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PatternValidationError> {
        let display = raw
            .as_ref()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut letters = Vec::with_capacity(display.len());
        for ch in display.chars().filter(|ch| !ch.is_whitespace()) {
            if !ch.is_alphanumeric() {
                return Err(PatternValidationError::UnsupportedCharacter(ch));
            }
            letters.push(ch);
        }
        if letters.is_empty() {
            return Err(PatternValidationError::Empty);
        }

        Ok(Self { display, letters })
    }

    /// Letters searched for, in order.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Normalised pattern text used in captions.
    pub fn as_str(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Strategy used to locate the pattern's letters inside a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingMode {
    /// Greedy leftmost scan over every character of the message.
    #[default]
    LetterScan,
    /// Letters must start consecutive whitespace-separated tokens.
    TokenInitial,
}

/// Error raised when a matching mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown matching mode '{0}'; expected letter-scan or token-initial")]
pub struct UnknownMatchingMode(pub String);

impl FromStr for MatchingMode {
    type Err = UnknownMatchingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "letter-scan" | "letters" => Ok(Self::LetterScan),
            "token-initial" | "tokens" => Ok(Self::TokenInitial),
            _ => Err(UnknownMatchingMode(s.to_owned())),
        }
    }
}

impl fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LetterScan => "letter-scan",
            Self::TokenInitial => "token-initial",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_patterns_are_rejected(#[case] raw: &str) {
        assert_eq!(Pattern::new(raw), Err(PatternValidationError::Empty));
    }

    #[rstest]
    fn punctuation_is_rejected() {
        assert_eq!(
            Pattern::new("o.w.l"),
            Err(PatternValidationError::UnsupportedCharacter('.'))
        );
    }

    #[rstest]
    fn pattern_is_lower_cased_and_collapsed() {
        let pattern = Pattern::new("  OWL   Eyes ").expect("valid");
        assert_eq!(pattern.as_str(), "owl eyes");
        assert_eq!(pattern.letters().len(), 7);
    }

    #[rstest]
    #[case("letter-scan", MatchingMode::LetterScan)]
    #[case("LETTER_SCAN", MatchingMode::LetterScan)]
    #[case("token-initial", MatchingMode::TokenInitial)]
    #[case(" tokens ", MatchingMode::TokenInitial)]
    fn matching_mode_parses_known_names(#[case] raw: &str, #[case] expected: MatchingMode) {
        assert_eq!(raw.parse::<MatchingMode>(), Ok(expected));
    }

    #[rstest]
    fn matching_mode_rejects_unknown_names() {
        let err = "fuzzy".parse::<MatchingMode>().expect_err("unknown mode");
        assert!(err.to_string().contains("fuzzy"));
    }

    #[rstest]
    fn matching_mode_display_round_trips() {
        for mode in [MatchingMode::LetterScan, MatchingMode::TokenInitial] {
            assert_eq!(mode.to_string().parse::<MatchingMode>(), Ok(mode));
        }
    }
}
