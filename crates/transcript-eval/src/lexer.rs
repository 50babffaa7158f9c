//! Hand-written tokenizer.
//!
//! Lexes one physical line at a time so the interactive console can probe
//! bracket depth and spot unrecoverable lex errors before a statement is
//! complete.

use crate::error::SyntaxError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Num(f64),
    Str(String),

    // Keywords
    Fn,
    If,
    Else,
    While,
    Return,
    And,
    Or,
    Not,
    True,
    False,
    Null,

    // Punctuation and operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A token with its position within the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// 1-based line within the statement.
    pub line: usize,
    /// 0-based byte column within the line.
    pub column: usize,
}

fn keyword(name: &str) -> Option<Token> {
    match name {
        "fn" => Some(Token::Fn),
        "if" => Some(Token::If),
        "else" => Some(Token::Else),
        "while" => Some(Token::While),
        "return" => Some(Token::Return),
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "not" => Some(Token::Not),
        "true" => Some(Token::True),
        "false" => Some(Token::False),
        "null" => Some(Token::Null),
        _ => None,
    }
}

/// Tokenize one physical line. `#` starts a comment running to the end
/// of the line. Blank and comment-only lines lex to an empty vector.
pub fn lex_line(text: &str, line: usize) -> Result<Vec<Spanned>, SyntaxError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i];
        match c {
            b' ' | b'\t' => {
                i += 1;
                continue;
            }
            b'#' => break,
            b'\'' | b'"' => {
                let (value, len) = lex_string(text, i, line)?;
                tokens.push(spanned(Token::Str(value), line, start));
                i += len;
            }
            b'0'..=b'9' => {
                let mut end = i;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end < bytes.len()
                    && bytes[end] == b'.'
                    && end + 1 < bytes.len()
                    && bytes[end + 1].is_ascii_digit()
                {
                    end += 1;
                    while end < bytes.len() && bytes[end].is_ascii_digit() {
                        end += 1;
                    }
                }
                let value = text[i..end].parse::<f64>().map_err(|_| SyntaxError {
                    message: "invalid number literal".to_string(),
                    line,
                    column: start,
                })?;
                tokens.push(spanned(Token::Num(value), line, start));
                i = end;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let mut end = i;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let name = &text[i..end];
                let token = keyword(name).unwrap_or_else(|| Token::Name(name.to_string()));
                tokens.push(spanned(token, line, start));
                i = end;
            }
            _ => {
                let two = bytes.get(i + 1).map(|&b| [c, b]);
                let (token, len) = match two {
                    Some([b'=', b'=']) => (Token::EqEq, 2),
                    Some([b'!', b'=']) => (Token::NotEq, 2),
                    Some([b'<', b'=']) => (Token::Le, 2),
                    Some([b'>', b'=']) => (Token::Ge, 2),
                    _ => match c {
                        b'(' => (Token::LParen, 1),
                        b')' => (Token::RParen, 1),
                        b'[' => (Token::LBracket, 1),
                        b']' => (Token::RBracket, 1),
                        b',' => (Token::Comma, 1),
                        b':' => (Token::Colon, 1),
                        b'=' => (Token::Assign, 1),
                        b'+' => (Token::Plus, 1),
                        b'-' => (Token::Minus, 1),
                        b'*' => (Token::Star, 1),
                        b'/' => (Token::Slash, 1),
                        b'%' => (Token::Percent, 1),
                        b'<' => (Token::Lt, 1),
                        b'>' => (Token::Gt, 1),
                        _ => {
                            return Err(SyntaxError {
                                message: "invalid character".to_string(),
                                line,
                                column: start,
                            })
                        }
                    },
                };
                tokens.push(spanned(token, line, start));
                i += len;
            }
        }
    }

    Ok(tokens)
}

fn spanned(token: Token, line: usize, column: usize) -> Spanned {
    Spanned { token, line, column }
}

/// Lex a quoted string starting at byte `start`; returns the unescaped
/// value and the number of bytes consumed including both quotes.
fn lex_string(text: &str, start: usize, line: usize) -> Result<(String, usize), SyntaxError> {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let escape = bytes.get(i + 1).ok_or_else(|| SyntaxError {
                    message: "unterminated string literal".to_string(),
                    line,
                    column: start,
                })?;
                value.push(match escape {
                    b'n' => '\n',
                    b't' => '\t',
                    b'\\' => '\\',
                    b'\'' => '\'',
                    b'"' => '"',
                    _ => {
                        return Err(SyntaxError {
                            message: "invalid escape sequence".to_string(),
                            line,
                            column: i,
                        })
                    }
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1 - start)),
            _ => {
                // Copy one whole character, not one byte.
                let ch = text[i..].chars().next().unwrap();
                value.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    Err(SyntaxError {
        message: "unterminated string literal".to_string(),
        line,
        column: start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        lex_line(text, 1).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert!(kinds("").is_empty());
        assert!(kinds("   ").is_empty());
        assert!(kinds("  # note").is_empty());
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            kinds("fn foo(x):"),
            vec![
                Token::Fn,
                Token::Name("foo".to_string()),
                Token::LParen,
                Token::Name("x".to_string()),
                Token::RParen,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1 2.5 10"), vec![
            Token::Num(1.0),
            Token::Num(2.5),
            Token::Num(10.0),
        ]);
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'a' "b\n" 'it\'s'"#),
            vec![
                Token::Str("a".to_string()),
                Token::Str("b\n".to_string()),
                Token::Str("it's".to_string()),
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("a == b != c <= d >= e"),
            vec![
                Token::Name("a".to_string()),
                Token::EqEq,
                Token::Name("b".to_string()),
                Token::NotEq,
                Token::Name("c".to_string()),
                Token::Le,
                Token::Name("d".to_string()),
                Token::Ge,
                Token::Name("e".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_line("x = 'oops", 3).unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_invalid_character() {
        let err = lex_line("a $ b", 1).unwrap_err();
        assert_eq!(err.message, "invalid character");
        assert_eq!(err.column, 2);
    }

    #[test]
    fn test_columns_are_recorded() {
        let tokens = lex_line("  a + b", 1).unwrap();
        assert_eq!(tokens[0].column, 2);
        assert_eq!(tokens[1].column, 4);
        assert_eq!(tokens[2].column, 6);
    }
}
