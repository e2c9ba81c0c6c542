//! # Tokenizer (C1)
//!
//! Splits source into `STRING`/`NUMBER`/`END_OF_LINE` tokens without any
//! awareness of which spellings are instructions, pseudo-ops, or registers —
//! that classification happens later, in the statement builder (C3), where
//! it can be fuzzy-matched against the pattern table (C2) instead of
//! rejected outright. Whitespace and commas separate tokens; a `;` starts a
//! comment that runs to end of line; a `"`-delimited run is a string literal
//! with `\n \r \t \\` escapes.

mod cursor;
mod token;

pub use token::{Token, TokenKind};

use crate::error::{AsmError, ErrorKind};
use crate::span::Span;
use cursor::Cursor;

/// Parsed result of a `Tokenizer::tokenize` call: the token stream plus any
/// lexical errors collected along the way (fail-collect, per spec §5).
#[derive(Debug, Default)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<AsmError>,
}

fn line_at(lines: &[&str], row: usize) -> String {
    lines.get(row).copied().unwrap_or("").to_string()
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | ',' | '\r' | '\n' | ';' | '"')
}

/// Parse a bare lexeme (sign already included) as a NUMBER, trying in
/// order: `0x`/`x` hex, `0b`/`b` binary, `#` decimal, bare decimal. Returns
/// `None` if the lexeme doesn't wholly match one of those forms, in which
/// case the caller falls back to a STRING token.
fn parse_number(lexeme: &str) -> Option<i32> {
    let (negative, rest) = if let Some(r) = lexeme.strip_prefix('-') {
        (true, r)
    } else if let Some(r) = lexeme.strip_prefix('+') {
        (false, r)
    } else {
        (false, lexeme)
    };

    let (radix, digits) = if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
        (16, d)
    } else if let Some(d) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, d)
    } else if let Some(d) = rest.strip_prefix('b').or_else(|| rest.strip_prefix('B')) {
        (2, d)
    } else if let Some(d) = rest.strip_prefix('#') {
        (10, d)
    } else {
        (10, rest)
    };

    // The canonical immediate form is `#-1` — the sign after the radix
    // prefix rather than before it — so a sign is accepted in either
    // position and the two combine (XOR) rather than one being ignored.
    let (inner_negative, digits) = if let Some(d) = digits.strip_prefix('-') {
        (true, d)
    } else if let Some(d) = digits.strip_prefix('+') {
        (false, d)
    } else {
        (false, digits)
    };
    let negative = negative ^ inner_negative;

    if digits.is_empty() {
        return None;
    }
    let valid = match radix {
        16 => digits.chars().all(|c| c.is_ascii_hexdigit()),
        2 => digits.chars().all(|c| c == '0' || c == '1'),
        10 => digits.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };
    if !valid {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

fn lex_word(cursor: &mut Cursor, lines: &[&str], row: usize, col: usize) -> Token {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if is_separator(c) {
            break;
        }
        text.push(c);
        cursor.advance();
    }
    let number_value = parse_number(&text);
    let kind = if number_value.is_some() {
        TokenKind::Number
    } else {
        TokenKind::Str
    };
    Token {
        kind,
        span: Span::new(row, col, text.len().max(1)),
        text,
        number_value,
        line_text: line_at(lines, row),
    }
}

/// Consume a `"`-delimited string literal. Always returns a token — even an
/// unterminated literal is captured as-is, so the pipeline never silently
/// drops input — plus an error when the closing quote was never found.
fn lex_string(cursor: &mut Cursor, lines: &[&str], row: usize, col: usize) -> (Token, Option<AsmError>) {
    cursor.advance(); // opening quote
    let mut text = String::new();
    let mut terminated = false;

    while let Some(c) = cursor.peek() {
        match c {
            '"' => {
                cursor.advance();
                terminated = true;
                break;
            }
            '\n' => break,
            '\\' => {
                cursor.advance();
                match cursor.peek() {
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('t') => text.push('\t'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some(other) => text.push(other),
                    None => break,
                }
                cursor.advance();
            }
            _ => {
                text.push(c);
                cursor.advance();
            }
        }
    }

    let len = (text.len() + 2).max(1);
    let token = Token {
        kind: TokenKind::Str,
        span: Span::new(row, col, len),
        text,
        number_value: None,
        line_text: line_at(lines, row),
    };

    let error = if terminated {
        None
    } else {
        Some(AsmError::error(
            ErrorKind::UnterminatedString,
            "unterminated string literal",
            Span::new(row, col, len),
        ))
    };

    (token, error)
}

/// Tokenize the whole source. Always terminates the token stream with a
/// trailing `END_OF_LINE`, even when the source doesn't end in a newline, so
/// downstream code can uniformly split on `TokenKind::EndOfLine` boundaries.
pub fn tokenize(source: &str) -> LexResult {
    let lines: Vec<&str> = source.lines().collect();
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !cursor.is_at_end() {
        while matches!(cursor.peek(), Some(' ' | '\t' | ',' | '\r')) {
            cursor.advance();
        }
        if cursor.is_at_end() {
            break;
        }

        let (row, col) = cursor.position();
        match cursor.peek().unwrap() {
            '\n' => {
                cursor.advance();
                tokens.push(Token {
                    kind: TokenKind::EndOfLine,
                    text: String::new(),
                    number_value: None,
                    line_text: line_at(&lines, row),
                    span: Span::new(row, col, 0),
                });
            }
            ';' => {
                while !matches!(cursor.peek(), Some('\n') | None) {
                    cursor.advance();
                }
            }
            '"' => {
                let (token, error) = lex_string(&mut cursor, &lines, row, col);
                tokens.push(token);
                if let Some(error) = error {
                    errors.push(error);
                }
            }
            _ => {
                tokens.push(lex_word(&mut cursor, &lines, row, col));
            }
        }
    }

    if !matches!(tokens.last(), Some(t) if t.is_end_of_line()) {
        let (row, col) = cursor.position();
        tokens.push(Token {
            kind: TokenKind::EndOfLine,
            text: String::new(),
            number_value: None,
            line_text: line_at(&lines, row),
            span: Span::new(row, col, 0),
        });
    }

    LexResult { tokens, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(result: &LexResult) -> Vec<TokenKind> {
        result.tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn splits_whitespace_and_comma_separated_words() {
        let result = tokenize("ADD R0,R1,R2");
        assert_eq!(
            result.tokens[..4].iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["ADD", "R0", "R1", "R2"]
        );
    }

    #[test]
    fn recognizes_hex_binary_decimal_and_pound_decimal() {
        assert_eq!(parse_number("x3000"), Some(0x3000));
        assert_eq!(parse_number("0x3000"), Some(0x3000));
        assert_eq!(parse_number("b1010"), Some(0b1010));
        assert_eq!(parse_number("#10"), Some(10));
        assert_eq!(parse_number("10"), Some(10));
        assert_eq!(parse_number("-1"), Some(-1));
        assert_eq!(parse_number("+1"), Some(1));
    }

    #[test]
    fn negative_sign_after_the_radix_prefix_also_parses() {
        // The canonical immediate form is `#-1`, not `-#1`.
        assert_eq!(parse_number("#-1"), Some(-1));
        assert_eq!(parse_number("x-1"), Some(-1));
        assert_eq!(parse_number("b-1"), Some(-1));
        assert_eq!(parse_number("#+1"), Some(1));
    }

    #[test]
    fn labels_that_look_like_prefixed_numbers_stay_strings() {
        assert_eq!(parse_number("DATA0"), None);
        assert_eq!(parse_number("XYZ"), None);
        assert_eq!(parse_number("B"), None);
    }

    #[test]
    fn comment_runs_to_end_of_line_without_consuming_the_newline() {
        let result = tokenize("ADD R0,R1,R2 ; add them up\nHALT");
        let texts: Vec<&str> = result
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::EndOfLine)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["ADD", "R0", "R1", "R2", "HALT"]);
        assert_eq!(kinds(&result).iter().filter(|k| **k == TokenKind::EndOfLine).count(), 2);
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let result = tokenize("\"a\\nb\\t\\\"c\"");
        assert_eq!(result.tokens[0].text, "a\nb\t\"c");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn unterminated_string_is_a_fatal_lexical_error_but_still_yields_a_token() {
        let result = tokenize("\"unterminated");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::UnterminatedString);
        assert_eq!(result.tokens[0].text, "unterminated");
    }

    #[test]
    fn blank_lines_still_emit_end_of_line() {
        let result = tokenize("ADD R0,R1,R2\n\nHALT");
        assert_eq!(kinds(&result).iter().filter(|k| **k == TokenKind::EndOfLine).count(), 3);
    }

    #[test]
    fn trailing_newline_does_not_duplicate_the_closing_end_of_line() {
        let result = tokenize("HALT\n");
        let eols = kinds(&result).iter().filter(|k| **k == TokenKind::EndOfLine).count();
        assert_eq!(eols, 1);
    }
}
