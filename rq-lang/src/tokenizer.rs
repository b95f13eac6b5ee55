use std::{fmt::Display, ops::Range, rc::Rc};

use serde_json::Number;

use crate::syntax_error::SyntaxError;

pub(crate) type TokenWithRange = (Token, Range<usize>);

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Dot,
    Comma,
    Colon,
    Semicolon,
    QuestionMark,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Plus,
    Minus,
    Multiply,
    Divide,
    Percent,
    Bang,
    Equals,
    PlusEquals,
    MinusEquals,
    EqualsEquals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    And,
    Or,
    True,
    False,
    Null,
    Apply,
    Identifier(Rc<str>),
    StringLiteral(Rc<str>),
    NumericLiteral(Number),
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::QuestionMark => write!(f, "?"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Multiply => write!(f, "*"),
            Token::Divide => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::Equals => write!(f, "="),
            Token::PlusEquals => write!(f, "+="),
            Token::MinusEquals => write!(f, "-="),
            Token::EqualsEquals => write!(f, "=="),
            Token::NotEquals => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::LessThanOrEqualTo => write!(f, "<="),
            Token::GreaterThan => write!(f, ">"),
            Token::GreaterThanOrEqualTo => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Apply => write!(f, "apply"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::StringLiteral(string) => {
                write!(f, "{}", serde_json::Value::String(string.to_string()))
            }
            Token::NumericLiteral(number) => write!(f, "{}", number),
        }
    }
}

pub struct Tokenizer<T: AsRef<str>> {
    string: T,
    index: usize,
    errored: bool,
}

impl<T: AsRef<str>> Tokenizer<T> {
    pub fn new(string: T) -> Self {
        Tokenizer {
            string,
            index: 0,
            errored: false,
        }
    }

    fn bytes(&self) -> &[u8] {
        self.string.as_ref().as_bytes()
    }

    fn remaining_bytes(&self) -> &[u8] {
        &self.bytes()[self.index..]
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.remaining_bytes().get(offset).copied()
    }

    fn chomp_leading_whitespace(&mut self) {
        let whitespace = self
            .remaining_bytes()
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();
        self.index += whitespace;
    }

    fn chomp_one_or_two_characters(&mut self) -> Option<Token> {
        let byte = self.peek_byte_at(0)?;
        let next = self.peek_byte_at(1);
        let (token, len) = match (byte, next) {
            (b'+', Some(b'=')) => (Token::PlusEquals, 2),
            (b'-', Some(b'=')) => (Token::MinusEquals, 2),
            (b'=', Some(b'=')) => (Token::EqualsEquals, 2),
            (b'!', Some(b'=')) => (Token::NotEquals, 2),
            (b'<', Some(b'=')) => (Token::LessThanOrEqualTo, 2),
            (b'>', Some(b'=')) => (Token::GreaterThanOrEqualTo, 2),
            (b'&', Some(b'&')) => (Token::And, 2),
            (b'|', Some(b'|')) => (Token::Or, 2),
            (b'.', _) => (Token::Dot, 1),
            (b',', _) => (Token::Comma, 1),
            (b':', _) => (Token::Colon, 1),
            (b';', _) => (Token::Semicolon, 1),
            (b'?', _) => (Token::QuestionMark, 1),
            (b'(', _) => (Token::LeftParen, 1),
            (b')', _) => (Token::RightParen, 1),
            (b'[', _) => (Token::LeftBracket, 1),
            (b']', _) => (Token::RightBracket, 1),
            (b'{', _) => (Token::LeftBrace, 1),
            (b'}', _) => (Token::RightBrace, 1),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Multiply, 1),
            (b'/', _) => (Token::Divide, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'=', _) => (Token::Equals, 1),
            (b'<', _) => (Token::LessThan, 1),
            (b'>', _) => (Token::GreaterThan, 1),
            _ => return None,
        };
        self.index += len;
        Some(token)
    }

    fn chomp_identifier_or_keyword(&mut self) -> Option<Token> {
        let remaining = self.remaining_bytes();
        match remaining.first() {
            Some(byte) if byte.is_ascii_alphabetic() || *byte == b'_' => {}
            _ => return None,
        }
        let len = remaining
            .iter()
            .take_while(|byte| byte.is_ascii_alphanumeric() || **byte == b'_')
            .count();
        let start = self.index;
        self.index += len;
        let name = &self.string.as_ref()[start..self.index];
        Some(match name {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "apply" => Token::Apply,
            _ => Token::Identifier(name.into()),
        })
    }

    fn count_digits_at(&self, offset: usize) -> usize {
        self.remaining_bytes()
            .iter()
            .skip(offset)
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    }

    fn chomp_number(&mut self) -> Option<Result<Token, SyntaxError>> {
        let mut len = self.count_digits_at(0);
        if len == 0 {
            return None;
        }
        let mut is_integer = true;

        // A fraction needs at least one digit after the dot.
        if self.peek_byte_at(len) == Some(b'.') {
            let fraction = self.count_digits_at(len + 1);
            is_integer = false;
            len += 1 + fraction;
            if fraction == 0 {
                return Some(Err(self.invalid_number(len)));
            }
        }

        if let Some(b'e' | b'E') = self.peek_byte_at(len) {
            is_integer = false;
            len += 1;
            if let Some(b'+' | b'-') = self.peek_byte_at(len) {
                len += 1;
            }
            let exponent = self.count_digits_at(len);
            len += exponent;
            if exponent == 0 {
                return Some(Err(self.invalid_number(len)));
            }
        }

        // Catch things like `12abc` here rather than tokenizing them as a
        // number followed by an identifier.
        let trailing = self
            .remaining_bytes()
            .iter()
            .skip(len)
            .take_while(|byte| byte.is_ascii_alphanumeric() || **byte == b'_' || **byte == b'.')
            .count();
        if trailing > 0 {
            return Some(Err(self.invalid_number(len + trailing)));
        }

        let digits = &self.string.as_ref()[self.index..self.index + len];
        let number = if is_integer {
            match digits.parse::<i64>() {
                Ok(integer) => Some(Number::from(integer)),
                Err(_) => digits.parse::<f64>().ok().and_then(Number::from_f64),
            }
        } else {
            digits.parse::<f64>().ok().and_then(Number::from_f64)
        };

        match number {
            Some(number) => {
                self.index += len;
                Some(Ok(Token::NumericLiteral(number)))
            }
            None => Some(Err(self.invalid_number(len))),
        }
    }

    fn invalid_number(&self, len: usize) -> SyntaxError {
        SyntaxError::InvalidNumber(self.index..self.index + len)
    }

    fn chomp_string(&mut self) -> Option<Result<Token, SyntaxError>> {
        if self.peek_byte_at(0) != Some(b'"') {
            return None;
        }
        let start = self.index;
        let source = self.string.as_ref();
        let mut string = String::new();
        let mut chars = source[start + 1..].char_indices();

        while let Some((offset, char)) = chars.next() {
            let position = start + 1 + offset;
            match char {
                '"' => {
                    self.index = position + 1;
                    return Some(Ok(Token::StringLiteral(string.into())));
                }
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, '"')) => '"',
                        Some((_, '\\')) => '\\',
                        Some((_, '/')) => '/',
                        Some((_, 'b')) => '\u{08}',
                        Some((_, 'f')) => '\u{0c}',
                        Some((_, 'n')) => '\n',
                        Some((_, 'r')) => '\r',
                        Some((_, 't')) => '\t',
                        Some((_, 'u')) => match decode_unicode_escape(&source[position..]) {
                            Some((char, len)) => {
                                // Skip past everything after the initial `\u`.
                                for _ in 0..len - 2 {
                                    chars.next();
                                }
                                char
                            }
                            None => {
                                return Some(Err(SyntaxError::InvalidEscape(
                                    position..position + 2,
                                )))
                            }
                        },
                        Some((offset, other)) => {
                            let end = start + 1 + offset + other.len_utf8();
                            return Some(Err(SyntaxError::InvalidEscape(position..end)));
                        }
                        None => return Some(Err(SyntaxError::UnterminatedStringLiteral(start))),
                    };
                    string.push(escaped);
                }
                _ => string.push(char),
            }
        }

        Some(Err(SyntaxError::UnterminatedStringLiteral(start)))
    }

    fn chomp_next_token(&mut self) -> Result<TokenWithRange, SyntaxError> {
        let token_start_index = self.index;
        let result = if let Some(result) = self.chomp_string() {
            result
        } else if let Some(result) = self.chomp_number() {
            result
        } else if let Some(token) = self.chomp_identifier_or_keyword() {
            Ok(token)
        } else if let Some(token) = self.chomp_one_or_two_characters() {
            Ok(token)
        } else {
            Err(SyntaxError::IllegalCharacter(self.index))
        };
        match result {
            Ok(token) => Ok((token, token_start_index..self.index)),
            Err(err) => Err(err),
        }
    }

    pub fn remaining_tokens(mut self) -> Result<Vec<TokenWithRange>, SyntaxError> {
        let mut tokens: Vec<TokenWithRange> = vec![];
        for token in &mut self {
            tokens.push(token?);
        }
        Ok(tokens)
    }
}

impl<T: AsRef<str>> Iterator for Tokenizer<T> {
    type Item = Result<TokenWithRange, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }

        self.chomp_leading_whitespace();

        if self.index == self.bytes().len() {
            return None;
        }

        let result = self.chomp_next_token();

        if result.is_err() {
            self.errored = true;
        }

        Some(result)
    }
}

fn parse_hex_quad(string: &str) -> Option<u32> {
    let digits = string.get(..4)?;
    if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Decodes a `\uXXXX` escape (or a `\uXXXX\uXXXX` surrogate pair) at the
/// start of `string`, returning the character and the number of bytes
/// the escape occupies.
fn decode_unicode_escape(string: &str) -> Option<(char, usize)> {
    let high = parse_hex_quad(string.get(2..)?)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).map(|char| (char, 6));
    }
    if string.get(6..8)? != "\\u" {
        return None;
    }
    let low = parse_hex_quad(string.get(8..)?)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    let code_point = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code_point).map(|char| (char, 12))
}
