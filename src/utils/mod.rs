//! Text helpers shared by the reply pipeline and the log previews.

use std::borrow::Cow;

/// Suffix appended to replies that were shortened.
pub const ELLIPSIS: &str = "...";

/// Truncate a string to at most `max_bytes` bytes, ensuring the cut lands on a
/// valid UTF-8 char boundary. Returns the longest prefix that fits.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten `text` to at most `max_chars` characters, cutting at the last
/// whitespace so no word is split, and append [`ELLIPSIS`].
///
/// Text that already fits is returned unchanged (minus trailing whitespace).
/// A single token longer than the limit is the one case that gets a hard cut,
/// since there is no boundary to fall back to.
pub fn truncate_words(text: &str, max_chars: usize) -> Cow<'_, str> {
    let text = text.trim_end();
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return Cow::Borrowed(text);
    };

    let head = &text[..cut];
    let at_boundary = text[cut..].starts_with(char::is_whitespace);
    let kept = if at_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(pos) => &head[..pos],
            None => head,
        }
    };

    let trimmed = kept.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '.')
    });
    // A prefix made only of punctuation keeps its punctuation.
    let kept = match (trimmed.is_empty(), kept.trim_end()) {
        (false, _) => trimmed,
        (true, "") => head,
        (true, untrimmed) => untrimmed,
    };
    Cow::Owned(format!("{kept}{ELLIPSIS}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_truncate_str_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_multibyte_boundary() {
        // ñ is 2 bytes in UTF-8
        let s = "mañana";
        assert_eq!(truncate_str(s, 2), "ma");
        assert_eq!(truncate_str(s, 3), "ma"); // inside ñ, backs up to 2
        assert_eq!(truncate_str(s, 4), "mañ");
    }

    #[test]
    fn test_truncate_str_emoji() {
        // 🤖 is 4 bytes
        let s = "hi🤖bye";
        assert_eq!(truncate_str(s, 3), "hi");
        assert_eq!(truncate_str(s, 6), "hi🤖");
        assert_eq!(truncate_str("", 0), "");
    }

    #[test]
    fn test_truncate_words_fits() {
        assert_eq!(truncate_words("hello world", 11), "hello world");
        assert_eq!(truncate_words("hello world  ", 11), "hello world");
        assert_eq!(truncate_words("", 5), "");
    }

    #[test]
    fn test_truncate_words_breaks_before_partial_word() {
        assert_eq!(truncate_words("hello world foo", 10), "hello...");
    }

    #[test]
    fn test_truncate_words_keeps_word_ending_at_limit() {
        assert_eq!(truncate_words("hello world foo", 11), "hello world...");
        assert_eq!(truncate_words("hello world foo", 12), "hello world...");
    }

    #[test]
    fn test_truncate_words_drops_trailing_punctuation() {
        assert_eq!(
            truncate_words("Claro, con gusto. Te cuento todo", 17),
            "Claro, con gusto..."
        );
        assert_eq!(truncate_words("uno, dos, tres", 9), "uno, dos...");
    }

    #[test]
    fn test_truncate_words_punctuation_only_prefix_is_kept() {
        let out = truncate_words("... ... ... ... ... ... ... ... abc", 16);
        assert_eq!(out, "... ... ... ......");
        assert_eq!(truncate_words("!!!!!!!!!!", 4), "!!!!...");
        assert_eq!(truncate_words("-- --------", 4), "--...");
    }

    #[test]
    fn test_truncate_words_multibyte() {
        assert_eq!(truncate_words("mañana será otro día", 12), "mañana será...");
        assert_eq!(truncate_words("¿Qué tal? 🤖🤖🤖", 10), "¿Qué tal?...");
    }

    #[test]
    fn test_truncate_words_single_long_token() {
        assert_eq!(truncate_words("supercalifragilistic", 5), "super...");
    }

    proptest! {
        #[test]
        fn prop_truncate_words_never_splits_a_word(
            words in proptest::collection::vec("[a-zñ]{1,8}", 1..30),
            limit in 8usize..80,
        ) {
            let text = words.join(" ");
            let out = truncate_words(&text, limit);

            if text.chars().count() <= limit {
                prop_assert_eq!(&*out, text.as_str());
            } else {
                let kept = out.strip_suffix(ELLIPSIS).expect("truncated output ends with ellipsis");
                prop_assert!(kept.chars().count() <= limit);
                prop_assert!(text.starts_with(kept));
                let rest = &text[kept.len()..];
                prop_assert!(rest.is_empty() || rest.starts_with(' '));
            }
        }
    }
}
