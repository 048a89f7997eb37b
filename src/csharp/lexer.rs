//! Lexer for C# source files.
//!
//! Only what the declaration parser needs is tokenized precisely. Expression
//! syntax inside initializers and member bodies is skipped by the parser, so
//! operators are lexed loosely.

use std::iter::Peekable;
use std::str::CharIndices;

/// Token kinds for C# declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifiers and literals
    Ident(String),
    StringLiteral(String),
    CharLiteral,
    NumberLiteral(String),

    // Declaration keywords
    Using,
    Namespace,
    Class,
    Struct,
    Record,
    Interface,
    Enum,
    Delegate,
    Event,
    Operator,
    Implicit,
    Explicit,
    This,
    Where,

    // Modifiers
    Public,
    Private,
    Protected,
    Internal,
    Static,
    Const,
    Readonly,
    Abstract,
    Sealed,
    Partial,
    Virtual,
    Override,
    New,
    Extern,
    Unsafe,
    Volatile,
    Required,

    // Punctuation
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    LAngle,     // <
    RAngle,     // >
    Comma,      // ,
    Semicolon,  // ;
    Colon,      // :
    ColonColon, // ::
    Dot,        // .
    Question,   // ?
    Eq,         // =
    Arrow,      // =>
    Tilde,      // ~
    Star,       // *
    Minus,      // -
    /// Any other operator character; only ever skipped.
    Op(char),

    /// Text of a `///` documentation comment line, without the slashes.
    DocComment(String),
    Eof,
}

/// A token with its kind and byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}

/// Lexer for C# source text.
pub struct Lexer<'src> {
    src: &'src str,
    chars: Peekable<CharIndices<'src>>,
    pos: usize,
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            pos: 0,
            at_line_start: true,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                self.at_line_start = true;
            } else if !ch.is_whitespace() && ch != '\u{feff}' {
                break;
            }
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                None => break,
                _ => {}
            }
        }
    }

    fn read_line_rest(&mut self) -> String {
        let start = self.pos;
        self.skip_line();
        self.src[start..self.pos].trim_end_matches('\r').to_string()
    }

    fn read_string(&mut self) -> String {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        match escaped {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            '0' => s.push('\0'),
                            '\\' => s.push('\\'),
                            '"' => s.push('"'),
                            '\'' => s.push('\''),
                            _ => {
                                s.push('\\');
                                s.push(escaped);
                            }
                        }
                    }
                }
                Some('"') | None => break,
                Some(c) => s.push(c),
            }
        }
        s
    }

    /// `@"..."` strings: no escapes except doubled quotes.
    fn read_verbatim_string(&mut self) -> String {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('"') if self.peek() == Some('"') => {
                    self.advance();
                    s.push('"');
                }
                Some('"') | None => break,
                Some(c) => s.push(c),
            }
        }
        s
    }

    /// `"""..."""` raw strings. The opening quotes have been consumed.
    fn read_raw_string(&mut self) -> String {
        let start = self.pos;
        loop {
            if self.src[self.pos..].starts_with("\"\"\"") {
                let text = self.src[start..self.pos].to_string();
                for _ in 0..3 {
                    self.advance();
                }
                while self.peek() == Some('"') {
                    self.advance();
                }
                return text;
            }
            if self.advance().is_none() {
                return self.src[start..].to_string();
            }
        }
    }

    fn read_char_literal(&mut self) {
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('\'') | None => break,
                _ => {}
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                let exponent = (ch == 'e' || ch == 'E') && !s.starts_with("0x") && !s.starts_with("0X");
                s.push(ch);
                self.advance();
                if exponent && matches!(self.peek(), Some('+') | Some('-')) {
                    if let Some(sign) = self.advance() {
                        s.push(sign);
                    }
                }
            } else if ch == '.' && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn keyword_or_ident(&self, s: &str) -> TokenKind {
        match s {
            "using" => TokenKind::Using,
            "namespace" => TokenKind::Namespace,
            "class" => TokenKind::Class,
            "struct" => TokenKind::Struct,
            "record" => TokenKind::Record,
            "interface" => TokenKind::Interface,
            "enum" => TokenKind::Enum,
            "delegate" => TokenKind::Delegate,
            "event" => TokenKind::Event,
            "operator" => TokenKind::Operator,
            "implicit" => TokenKind::Implicit,
            "explicit" => TokenKind::Explicit,
            "this" => TokenKind::This,
            "where" => TokenKind::Where,
            "public" => TokenKind::Public,
            "private" => TokenKind::Private,
            "protected" => TokenKind::Protected,
            "internal" => TokenKind::Internal,
            "static" => TokenKind::Static,
            "const" => TokenKind::Const,
            "readonly" => TokenKind::Readonly,
            "abstract" => TokenKind::Abstract,
            "sealed" => TokenKind::Sealed,
            "partial" => TokenKind::Partial,
            "virtual" => TokenKind::Virtual,
            "override" => TokenKind::Override,
            "new" => TokenKind::New,
            "extern" => TokenKind::Extern,
            "unsafe" => TokenKind::Unsafe,
            "volatile" => TokenKind::Volatile,
            "required" => TokenKind::Required,
            _ => TokenKind::Ident(s.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let start = self.pos;
            let line_start = self.at_line_start;
            self.at_line_start = false;

            let ch = match self.advance() {
                Some(c) => c,
                None => return Token::new(TokenKind::Eof, start, start),
            };

            let kind = match ch {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '<' => TokenKind::LAngle,
                '>' => TokenKind::RAngle,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '.' => TokenKind::Dot,
                '?' => TokenKind::Question,
                '~' => TokenKind::Tilde,
                '*' => TokenKind::Star,
                '-' => TokenKind::Minus,
                ':' => {
                    if self.peek() == Some(':') {
                        self.advance();
                        TokenKind::ColonColon
                    } else {
                        TokenKind::Colon
                    }
                }
                '=' => match self.peek() {
                    Some('>') => {
                        self.advance();
                        TokenKind::Arrow
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::Op('=')
                    }
                    _ => TokenKind::Eq,
                },
                '#' if line_start => {
                    // Preprocessor directives occupy the whole line.
                    self.skip_line();
                    continue;
                }
                '/' => {
                    if self.peek() == Some('/') {
                        self.advance();
                        if self.peek() == Some('/') && self.peek_second() != Some('/') {
                            self.advance();
                            TokenKind::DocComment(self.read_line_rest())
                        } else {
                            self.skip_line();
                            continue;
                        }
                    } else if self.peek() == Some('*') {
                        self.advance();
                        self.skip_block_comment();
                        continue;
                    } else {
                        TokenKind::Op('/')
                    }
                }
                '"' => {
                    if self.src[self.pos..].starts_with("\"\"") {
                        self.advance();
                        self.advance();
                        TokenKind::StringLiteral(self.read_raw_string())
                    } else {
                        TokenKind::StringLiteral(self.read_string())
                    }
                }
                '@' if self.peek() == Some('"') => {
                    self.advance();
                    TokenKind::StringLiteral(self.read_verbatim_string())
                }
                '@' if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') => {
                    // `@class` escapes a keyword into an identifier.
                    let first = self.advance().unwrap_or('_');
                    TokenKind::Ident(self.read_ident(first))
                }
                '$' if self.peek() == Some('"') => {
                    self.advance();
                    TokenKind::StringLiteral(self.read_string())
                }
                '$' if self.peek() == Some('@') => {
                    self.advance();
                    self.advance();
                    TokenKind::StringLiteral(self.read_verbatim_string())
                }
                '\'' => {
                    self.read_char_literal();
                    TokenKind::CharLiteral
                }
                c if c.is_ascii_digit() => TokenKind::NumberLiteral(self.read_number(c)),
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_ident(c);
                    self.keyword_or_ident(&ident)
                }
                c if c.is_whitespace() => continue,
                c => TokenKind::Op(c),
            };

            return Token::new(kind, start, self.pos);
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
