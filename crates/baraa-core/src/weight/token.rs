//! # Tokenizer
//!
//! Splits product text into spans the rule evaluator reasons about.
//!
//! ```text
//! "6 x 500g (Diameter 12 x 9cm)"
//!
//!  Number(6) Multiplier Number(500) Unit(g) Punct('(') Word(Diameter)
//!  Number(12) Multiplier Number(9) Unit(cm) Punct(')')
//! ```
//!
//! Whitespace never produces a token, so "adjacent" in the rules means
//! "consecutive tokens". Units are only recognised directly after a number;
//! a lone "L" is a `Word`, "1.5L" is `Number` + `Unit`.

use crate::locale::{Locale, Unit};

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A decimal number. `integral` is true for "6" and "74.0" alike.
    Number { value: f64, integral: bool },
    /// A unit that directly follows a number.
    Unit(Unit),
    /// A standalone multiplication sign (x, X, *, х, ×).
    Multiplier,
    /// A run of letters.
    Word,
    /// Any other single character.
    Punct,
}

/// A token with its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    /// Returns the number value if this is a number token.
    pub fn number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Number { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the unit if this is a unit token.
    pub fn unit(&self) -> Option<Unit> {
        match self.kind {
            TokenKind::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    #[inline]
    pub fn is_multiplier(&self) -> bool {
        matches!(self.kind, TokenKind::Multiplier)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self.kind, TokenKind::Number { .. })
    }

    #[inline]
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word)
    }
}

/// Tokenizes `text` using the unit and multiplier tables of `locale`.
pub fn tokenize<'a>(text: &'a str, locale: &Locale) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        let char_end = pos + c.len_utf8();

        if c.is_whitespace() {
            pos = char_end;
            continue;
        }

        if c.is_ascii_digit() {
            let end = scan_number(text, pos);
            let literal = &text[pos..end];
            // Only ASCII digits, group commas and one '.', so the parse cannot fail.
            let value: f64 = literal.replace(',', "").parse().unwrap_or(0.0);
            tokens.push(Token {
                kind: TokenKind::Number {
                    value,
                    integral: value.fract() == 0.0,
                },
                text: literal,
                start: pos,
                end,
            });
            pos = end;

            let unit_start = skip_whitespace(text, pos);
            if let Some((unit, len)) = locale.match_unit(&text[unit_start..]) {
                tokens.push(Token {
                    kind: TokenKind::Unit(unit),
                    text: &text[unit_start..unit_start + len],
                    start: unit_start,
                    end: unit_start + len,
                });
                pos = unit_start + len;
            }
            continue;
        }

        if locale.is_multiplier_symbol(c) && stands_alone(text, pos, char_end, c) {
            tokens.push(Token {
                kind: TokenKind::Multiplier,
                text: &text[pos..char_end],
                start: pos,
                end: char_end,
            });
            pos = char_end;
            continue;
        }

        if c.is_alphabetic() {
            let end = text[pos..]
                .char_indices()
                .find(|(_, ch)| !ch.is_alphabetic())
                .map_or(text.len(), |(idx, _)| pos + idx);
            tokens.push(Token {
                kind: TokenKind::Word,
                text: &text[pos..end],
                start: pos,
                end,
            });
            pos = end;
            continue;
        }

        tokens.push(Token {
            kind: TokenKind::Punct,
            text: &text[pos..char_end],
            start: pos,
            end: char_end,
        });
        pos = char_end;
    }

    tokens
}

/// Scans `digits (',' ddd)* ('.' digits)?` starting at `start`.
///
/// A comma only groups thousands when exactly three digits follow it, so
/// "1,000g" is one number while "1,5kg" stays two.
fn scan_number(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let digit_at = |idx: usize| idx < bytes.len() && bytes[idx].is_ascii_digit();

    let mut end = start;
    while digit_at(end) {
        end += 1;
    }
    while end < bytes.len()
        && bytes[end] == b','
        && (end + 1..end + 4).all(digit_at)
        && !digit_at(end + 4)
    {
        end += 4;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    end
}

fn skip_whitespace(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(idx, _)| start + idx)
}

/// Letter-shaped multipliers ('x', 'х') only count outside words, so "Box 6"
/// is a word and a number, while "x6" and "500g x 6" carry a multiplier.
fn stands_alone(text: &str, start: usize, end: usize, c: char) -> bool {
    if !c.is_alphabetic() {
        return true;
    }
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, &Locale::default())
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_number_followed_by_unit() {
        let tokens = tokenize("500 g", &Locale::default());
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].number(), Some(500.0));
        assert_eq!(tokens[1].unit(), Some(Unit::Gram));
        assert_eq!(tokens[1].text, "g");
    }

    #[test]
    fn test_multiplier_forms() {
        assert_eq!(
            kinds("500g x 6"),
            vec![
                TokenKind::Number { value: 500.0, integral: true },
                TokenKind::Unit(Unit::Gram),
                TokenKind::Multiplier,
                TokenKind::Number { value: 6.0, integral: true },
            ]
        );
        assert!(tokenize("2*3", &Locale::default())[1].is_multiplier());
        assert!(tokenize("2 х 3", &Locale::default())[1].is_multiplier());
        assert!(tokenize("2×3", &Locale::default())[1].is_multiplier());
    }

    #[test]
    fn test_x_inside_word_is_not_a_multiplier() {
        let tokens = tokenize("Box 6", &Locale::default());
        assert!(tokens[0].is_word());
        assert_eq!(tokens[0].text, "Box");
        assert!(tokens.iter().all(|t| !t.is_multiplier()));
    }

    #[test]
    fn test_decimal_numbers_and_integral_flag() {
        let tokens = tokenize("74.0 16.5 3.", &Locale::default());
        assert_eq!(tokens[0].kind, TokenKind::Number { value: 74.0, integral: true });
        assert_eq!(tokens[1].kind, TokenKind::Number { value: 16.5, integral: false });
        assert_eq!(tokens[2].kind, TokenKind::Number { value: 3.0, integral: true });
        assert_eq!(tokens[3].kind, TokenKind::Punct);
    }

    #[test]
    fn test_thousands_grouping() {
        let tokens = tokenize("1,000g", &Locale::default());
        assert_eq!(tokens[0].number(), Some(1000.0));
        assert_eq!(tokens[0].text, "1,000");
        assert_eq!(tokens[1].unit(), Some(Unit::Gram));

        let tokens = tokenize("1,5kg", &Locale::default());
        assert_eq!(tokens[0].number(), Some(1.0));
        assert_eq!(tokens[2].number(), Some(5.0));
    }

    #[test]
    fn test_lone_letter_is_a_word_not_a_unit() {
        let tokens = tokenize("L 16 x 20cm", &Locale::default());
        assert!(tokens[0].is_word());
        assert_eq!(tokens[4].unit(), Some(Unit::Centimeter));
    }

    #[test]
    fn test_spans_cover_source_text() {
        let text = "코카콜라 1.5ℓ x 12";
        for token in tokenize(text, &Locale::default()) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }
}
