//! Placeholder scanning for criteria, expression and SQL text.
//!
//! The scanner understands just enough of the text to find `:name` and `?`
//! markers. Quoted strings (single, double or back quotes) are skipped,
//! honoring doubled quotes. Backslash escapes apply inside single and double
//! quotes only; back-quoted identifiers take them literally.

/// Placeholders found in one text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// Distinct `:name` placeholders in first-appearance order
    pub named: Vec<String>,
    /// Number of `?` markers
    pub positional: usize,
}

/// Quote opened but never closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedString {
    /// Character offset of the first character inside the quote
    pub position: usize,
}

impl UnterminatedString {
    pub fn message(&self) -> String {
        format!(
            "Unterminated quoted string starting at position {}",
            self.position
        )
    }
}

/// Placeholder name characters. The memory tokenizer accepts the same set.
pub fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Scan `text` for placeholders.
pub fn scan(text: &str) -> Result<Placeholders, UnterminatedString> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = Placeholders::default();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            quote @ ('\'' | '"' | '`') => {
                i = skip_quoted(&chars, i + 1, quote)?;
            }
            ':' if chars.get(i + 1).copied().is_some_and(is_name_char) => {
                let start = i + 1;
                i = start;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if !found.named.contains(&name) {
                    found.named.push(name);
                }
            }
            '?' => {
                found.positional += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    Ok(found)
}

/// Returns the index just past the closing quote.
fn skip_quoted(chars: &[char], start: usize, quote: char) -> Result<usize, UnterminatedString> {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && quote != '`' {
            i += 2;
        } else if c == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return Ok(i + 1);
            }
        } else {
            i += 1;
        }
    }
    Err(UnterminatedString { position: start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_in_first_appearance_order() {
        let found = scan("name = :name and age > :years or nick = :name").unwrap();
        assert_eq!(found.named, vec!["name", "years"]);
        assert_eq!(found.positional, 0);
    }

    #[test]
    fn test_positional() {
        let found = scan("select * from t where a = ? and b = ?").unwrap();
        assert_eq!(found.positional, 2);
        assert!(found.named.is_empty());
    }

    #[test]
    fn test_quoted_text_is_skipped() {
        let found = scan(r#"a = ':x' and b = "?" and `c:d` = :real"#).unwrap();
        assert_eq!(found.named, vec!["real"]);
        assert_eq!(found.positional, 0);
    }

    #[test]
    fn test_escaped_and_doubled_quotes() {
        let found = scan(r#"a = 'it''s :not' and b = "say \":no\"" and c = :yes"#).unwrap();
        assert_eq!(found.named, vec!["yes"]);
    }

    #[test]
    fn test_lone_colon_is_not_a_placeholder() {
        let found = scan("a = : and b = :").unwrap();
        assert!(found.named.is_empty());
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = scan(r#"name = "2"#).unwrap_err();
        assert_eq!(err.position, 8);
        assert_eq!(
            err.message(),
            "Unterminated quoted string starting at position 8"
        );
    }

    #[test]
    fn test_unicode_names() {
        let found = scan("nombre = :nombreé and ciudad = :città").unwrap();
        assert_eq!(found.named, vec!["nombreé", "città"]);
    }

    #[test]
    fn test_backslash_is_literal_in_back_quotes() {
        let found = scan(r"`odd\` = :x").unwrap();
        assert_eq!(found.named, vec!["x"]);
        assert!(scan(r"'odd\' = :x").is_err());
    }

    #[test]
    fn test_trailing_backslash_is_unterminated() {
        assert!(scan("a = 'abc\\").is_err());
    }

    proptest! {
        #[test]
        fn prop_names_inside_quotes_are_never_reported(name in "[a-z_][a-z0-9_]{0,8}") {
            let text = format!("field = ':{0}' and other = \"?:{0}\"", name);
            let found = scan(&text).unwrap();
            prop_assert!(found.named.is_empty());
            prop_assert_eq!(found.positional, 0);
        }

        #[test]
        fn prop_unquoted_names_are_reported(name in "[a-z_][a-z0-9_]{0,8}") {
            let text = format!("'literal :skip' = :{}", name);
            let found = scan(&text).unwrap();
            prop_assert_eq!(found.named, vec![name]);
        }
    }
}
