//! Display-title generation for archived recordings.
//!
//! A title is a short label derived from the source text. The policy, in
//! priority order:
//!
//! 1. Text of 50 characters or fewer is used verbatim.
//! 2. Otherwise the first sentence (split on `.`) is used if it fits.
//! 3. Otherwise the first comma-delimited clause is used if it fits.
//! 4. Otherwise whole words are packed greedily up to 47 characters and an
//!    ellipsis is appended.
//! 5. Otherwise (a single overlong word) the text is hard-truncated to 47
//!    characters plus the ellipsis.
//!
//! Deterministic, no I/O.

/// Maximum length of a generated title, in characters.
pub const MAX_TITLE_LEN: usize = 50;

/// Character budget before the appended `"..."`.
const PACK_LIMIT: usize = MAX_TITLE_LEN - 3;

/// Derive a short display title from the source text.
///
/// ## Examples
///
/// ```
/// use voxpop::title::suggest_title;
///
/// assert_eq!(suggest_title("A short note"), "A short note");
/// assert_eq!(
///     suggest_title("Hello world. This continues for a very long time past the limit"),
///     "Hello world."
/// );
/// ```
pub fn suggest_title(text: &str) -> String {
    let trimmed = text.trim();

    if char_len(trimmed) <= MAX_TITLE_LEN {
        return trimmed.to_string();
    }

    // Prefer the first sentence, with its period.
    if let Some((first, _rest)) = trimmed.split_once('.') {
        let sentence = format!("{}.", first.trim());
        if !first.trim().is_empty() && char_len(&sentence) <= MAX_TITLE_LEN {
            return sentence;
        }
    }

    // Then the first comma-delimited clause.
    if let Some((clause, _rest)) = trimmed.split_once(',') {
        let clause = clause.trim();
        if !clause.is_empty() && char_len(clause) <= MAX_TITLE_LEN {
            return clause.to_string();
        }
    }

    // Greedily pack whole words.
    let mut packed = String::new();
    for word in trimmed.split_whitespace() {
        let needed = if packed.is_empty() {
            char_len(word)
        } else {
            char_len(&packed) + 1 + char_len(word)
        };
        if needed > PACK_LIMIT {
            break;
        }
        if !packed.is_empty() {
            packed.push(' ');
        }
        packed.push_str(word);
    }
    if !packed.is_empty() {
        packed.push_str("...");
        return packed;
    }

    // Single word longer than the budget: hard truncate.
    let mut truncated: String = trimmed.chars().take(PACK_LIMIT).collect();
    truncated.push_str("...");
    truncated
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_verbatim() {
        let text = "Exactly forty characters of sample text!";
        assert_eq!(text.len(), 40);
        assert_eq!(suggest_title(text), text);
    }

    #[test]
    fn test_fifty_char_boundary() {
        let text = "x".repeat(50);
        assert_eq!(suggest_title(&text), text);

        let text = "y".repeat(51);
        assert_ne!(suggest_title(&text), text);
    }

    #[test]
    fn test_first_sentence_preferred() {
        let text = "Hello world. This continues for a very long time past the limit";
        assert_eq!(suggest_title(text), "Hello world.");
    }

    #[test]
    fn test_first_clause_preferred_when_sentence_too_long() {
        let text = "First clause here, and then the sentence goes on and on until well past the fifty character limit.";
        assert_eq!(suggest_title(text), "First clause here");
    }

    #[test]
    fn test_word_packing() {
        // 80 chars, no '.' or ',' break under 50 chars.
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliett kilo lima mike";
        assert!(text.len() >= 78);
        let title = suggest_title(text);

        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= MAX_TITLE_LEN);
        // Every piece before the ellipsis must be a whole input word.
        let packed = title.trim_end_matches("...");
        for word in packed.split_whitespace() {
            assert!(text.contains(word), "`{}` is not a whole word", word);
        }
    }

    #[test]
    fn test_hard_truncation_single_long_word() {
        let text = "a".repeat(120);
        let title = suggest_title(&text);
        assert_eq!(title.chars().count(), MAX_TITLE_LEN);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_leading_whitespace_trimmed() {
        assert_eq!(suggest_title("   padded   "), "padded");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(suggest_title(""), "");
        assert_eq!(suggest_title("   "), "");
    }

    #[test]
    fn test_determinism() {
        let text = "Hello world. This continues for a very long time past the limit";
        let first = suggest_title(text);
        for _ in 0..5 {
            assert_eq!(suggest_title(text), first);
        }
    }

    #[test]
    fn test_unicode_counts_chars_not_bytes() {
        // 30 characters but far more bytes; must come back verbatim.
        let text = "héllo wörld ünïcode tèxt héré!";
        assert!(text.len() > 30);
        assert!(text.chars().count() <= 50);
        assert_eq!(suggest_title(text), text);
    }

    #[test]
    fn test_result_never_exceeds_limit() {
        let repeated = "word ".repeat(40);
        let samples = [
            "short",
            "Hello world. Tail that runs well past the fifty character boundary for sure",
            "clause one, clause two, and a very long tail that exceeds the boundary easily here",
            repeated.as_str(),
        ];
        for text in samples {
            assert!(
                suggest_title(text).chars().count() <= MAX_TITLE_LEN,
                "title too long for input: {}",
                text
            );
        }
    }
}
