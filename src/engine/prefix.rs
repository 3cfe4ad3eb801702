//! Lookup-prefix derivation
//!
//! The host hands over the raw line text in front of the cursor; completion
//! queries only want the word currently being typed. The raw text is split on
//! unescaped shell metacharacters and whitespace and the final token wins.
//! Quoting is deliberately not modelled.

/// Derive the word being typed from the raw text before the cursor
///
/// Token boundaries are `|`, `&`, `<`, `>`, `(`, `)` and whitespace, unless
/// the character is escaped with a backslash. An unescaped `$` also starts a
/// fresh token but stays part of it, so `foo$BAR` yields `$BAR` and the
/// variable fetcher can see the sigil.
///
/// # Arguments
/// * `raw` - Line text from its start to the cursor
///
/// # Returns
/// * `&str` - The final token; may be empty
pub fn derive_prefix(raw: &str) -> &str {
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in raw.char_indices() {
        let escaped = prev == Some('\\');
        if !escaped {
            if is_boundary(c) {
                start = i + c.len_utf8();
            } else if c == '$' {
                start = i;
            }
        }
        prev = Some(c);
    }

    &raw[start..]
}

/// Shell metacharacters and whitespace that terminate a word
fn is_boundary(c: char) -> bool {
    matches!(c, '|' | '&' | '<' | '>' | '(' | ')') || c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_word_after_space() {
        assert_eq!(derive_prefix("git ch"), "ch");
        assert_eq!(derive_prefix("echo one two"), "two");
    }

    #[test]
    fn test_whole_text_without_boundaries() {
        assert_eq!(derive_prefix("gi"), "gi");
    }

    #[test]
    fn test_empty_and_trailing_space() {
        assert_eq!(derive_prefix(""), "");
        assert_eq!(derive_prefix("echo "), "");
    }

    #[test]
    fn test_metacharacters_split() {
        assert_eq!(derive_prefix("cat foo|gr"), "gr");
        assert_eq!(derive_prefix("a&&b"), "b");
        assert_eq!(derive_prefix("echo >out"), "out");
        assert_eq!(derive_prefix("$(ec"), "ec");
    }

    #[test]
    fn test_escaped_characters_do_not_split() {
        assert_eq!(derive_prefix("cat My\\ Docs/fi"), "My\\ Docs/fi");
        assert_eq!(derive_prefix("echo a\\|b"), "a\\|b");
    }

    #[test]
    fn test_sigil_starts_a_token() {
        assert_eq!(derive_prefix("foo$BAR"), "$BAR");
        assert_eq!(derive_prefix("echo $HO"), "$HO");
        assert_eq!(derive_prefix("price is \\$5"), "\\$5");
    }

    #[test]
    fn test_path_prefix_kept_whole() {
        assert_eq!(derive_prefix("cat src/ma"), "src/ma");
    }
}
