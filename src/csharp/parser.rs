//! Declaration parser for C# source files.
//!
//! Walks namespaces and type declarations and records what the translator
//! needs: names, base lists, public instance properties and fields, enum
//! values, attributes and `<summary>` docs. Member bodies and initializers
//! are skipped without being parsed.

use std::path::Path;

use super::lexer::{Lexer, Token, TokenKind};
use super::syntax::TypeSyntax;
use crate::host::{AttributeArg, HostAttribute, HostFile, HostMember, HostType, HostTypeKind};

/// A parse error at a byte offset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at {pos}: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a C# source file into host metadata.
pub fn parse_file(path: &Path, src: &str) -> ParseResult<HostFile> {
    let mut parser = Parser::new(src);
    let mut file = HostFile {
        path: path.to_path_buf(),
        ..HostFile::default()
    };
    parser.parse_namespace_body(&mut file, "", false)?;
    Ok(file)
}

/// Parse a standalone type reference such as `Dictionary<string, int[]>`.
pub fn parse_type_syntax(text: &str) -> ParseResult<TypeSyntax> {
    let mut parser = Parser::new(text);
    let ty = parser.parse_type()?;
    parser.expect(&TokenKind::Eof)?;
    Ok(ty)
}

#[derive(Debug, Default, Clone, Copy)]
struct Modifiers {
    public: bool,
    restricted: bool,
    is_static: bool,
    is_const: bool,
}

impl Modifiers {
    fn exported(&self) -> bool {
        self.public && !self.restricted && !self.is_static && !self.is_const
    }
}

struct Parser<'src> {
    /// Tokens without doc comments.
    tokens: Vec<Token>,
    /// Doc comment lines immediately preceding each token.
    docs: Vec<Vec<String>>,
    pos: usize,
    src: &'src str,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Self {
        let mut tokens = Vec::new();
        let mut docs = Vec::new();
        let mut pending = Vec::new();
        for token in Lexer::new(src).tokenize() {
            match token.kind {
                TokenKind::DocComment(line) => pending.push(line),
                _ => {
                    tokens.push(token);
                    docs.push(std::mem::take(&mut pending));
                }
            }
        }
        Self {
            tokens,
            docs,
            pos: 0,
            src,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", kind, self.peek())))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            pos: self.current().start,
        }
    }

    /// Identifiers, including contextual keywords that are valid names.
    fn expect_ident(&mut self) -> ParseResult<String> {
        let name = match self.peek() {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Record => "record".to_string(),
            TokenKind::Where => "where".to_string(),
            TokenKind::Partial => "partial".to_string(),
            TokenKind::Required => "required".to_string(),
            TokenKind::Implicit => "implicit".to_string(),
            TokenKind::Explicit => "explicit".to_string(),
            other => return Err(self.error(format!("expected identifier, found {other:?}"))),
        };
        self.advance();
        Ok(name)
    }

    fn is_ident(&self, text: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name == text)
    }

    /// Source text from `start` to the end of the previously consumed token.
    fn text_since(&self, start: usize) -> &'src str {
        let end = if self.pos == 0 {
            start
        } else {
            self.tokens[self.pos - 1].end.max(start)
        };
        self.src[start..end].trim()
    }

    fn docs_here(&self) -> Vec<String> {
        self.docs
            .get(self.pos.min(self.docs.len().saturating_sub(1)))
            .cloned()
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Namespaces and type declarations
    // ------------------------------------------------------------------

    fn parse_namespace_body(
        &mut self,
        file: &mut HostFile,
        namespace: &str,
        braced: bool,
    ) -> ParseResult<()> {
        loop {
            match self.peek() {
                TokenKind::Eof => {
                    if braced {
                        return Err(self.error("unterminated namespace"));
                    }
                    return Ok(());
                }
                TokenKind::RBrace if braced => {
                    self.advance();
                    self.matches(&TokenKind::Semicolon);
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Using => self.parse_using(file)?,
                TokenKind::Ident(word) if word == "global" && self.peek_nth(1) == &TokenKind::Using => {
                    self.advance();
                    self.parse_using(file)?;
                }
                TokenKind::Extern => self.skip_member(),
                TokenKind::Namespace => {
                    self.advance();
                    let name = self.parse_qualified_name()?;
                    let full = crate::host::qualify(namespace, &name);
                    if self.matches(&TokenKind::Semicolon) {
                        // File-scoped: the rest of the file belongs to it.
                        return self.parse_namespace_body(file, &full, braced);
                    }
                    self.expect(&TokenKind::LBrace)?;
                    self.parse_namespace_body(file, &full, true)?;
                }
                TokenKind::LBracket if self.is_global_attribute() => {
                    self.advance();
                    self.skip_until_close(&TokenKind::LBracket, &TokenKind::RBracket);
                }
                _ => {
                    let mut docs = self.docs_here();
                    let attributes = self.parse_attribute_lists()?;
                    if docs.is_empty() {
                        docs = self.docs_here();
                    }
                    self.parse_modifiers();
                    if self.check(&TokenKind::Delegate) {
                        self.skip_member();
                        continue;
                    }
                    let ty = self.parse_type_declaration(namespace, docs, attributes)?;
                    file.types.push(ty);
                }
            }
        }
    }

    fn parse_using(&mut self, file: &mut HostFile) -> ParseResult<()> {
        self.expect(&TokenKind::Using)?;
        // `using static X;` and `using Alias = X;` import no namespace.
        if self.check(&TokenKind::Static) || self.peek_nth(1) == &TokenKind::Eq {
            self.skip_member();
            return Ok(());
        }
        if self.check(&TokenKind::LParen) {
            // A using statement, not a directive.
            return Err(self.error("unexpected using statement at namespace level"));
        }
        let name = self.parse_qualified_name()?;
        self.expect(&TokenKind::Semicolon)?;
        file.usings.push(name);
        Ok(())
    }

    fn parse_qualified_name(&mut self) -> ParseResult<String> {
        if self.is_ident("global") && self.peek_nth(1) == &TokenKind::ColonColon {
            self.advance();
            self.advance();
        }
        let mut name = self.expect_ident()?;
        while self.matches(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn is_global_attribute(&self) -> bool {
        matches!(self.peek_nth(1), TokenKind::Ident(target) if target == "assembly" || target == "module")
            && self.peek_nth(2) == &TokenKind::Colon
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            match self.peek() {
                TokenKind::Public => modifiers.public = true,
                TokenKind::Private | TokenKind::Protected | TokenKind::Internal => {
                    modifiers.restricted = true
                }
                TokenKind::Static => modifiers.is_static = true,
                TokenKind::Const => modifiers.is_const = true,
                TokenKind::Readonly
                | TokenKind::Abstract
                | TokenKind::Sealed
                | TokenKind::Virtual
                | TokenKind::Override
                | TokenKind::New
                | TokenKind::Extern
                | TokenKind::Unsafe
                | TokenKind::Volatile
                | TokenKind::Required => {}
                TokenKind::Partial if self.peek_nth(1) != &TokenKind::LParen => {}
                _ => return modifiers,
            }
            self.advance();
        }
    }

    fn parse_type_declaration(
        &mut self,
        namespace: &str,
        docs: Vec<String>,
        attributes: Vec<HostAttribute>,
    ) -> ParseResult<HostType> {
        let kind = match self.peek() {
            TokenKind::Class | TokenKind::Struct => HostTypeKind::Class,
            TokenKind::Record => {
                if matches!(self.peek_nth(1), TokenKind::Class | TokenKind::Struct) {
                    self.advance();
                }
                HostTypeKind::Class
            }
            TokenKind::Interface => HostTypeKind::Interface,
            TokenKind::Enum => HostTypeKind::Enum,
            other => return Err(self.error(format!("expected type declaration, found {other:?}"))),
        };
        self.advance();

        let name = self.expect_ident()?;
        let mut ty = HostType {
            name,
            namespace: namespace.to_string(),
            kind,
            summary: doc_summary(&docs),
            attributes,
            ..HostType::default()
        };

        if self.matches(&TokenKind::LAngle) {
            self.skip_until_close(&TokenKind::LAngle, &TokenKind::RAngle);
        }
        if self.check(&TokenKind::LParen) {
            ty.members = self.parse_record_parameters()?;
        }
        if self.matches(&TokenKind::Colon) {
            loop {
                let start = self.current().start;
                self.parse_type()?;
                let base = self.text_since(start).to_string();
                if self.matches(&TokenKind::LParen) {
                    // Record base with primary constructor arguments.
                    self.skip_until_close(&TokenKind::LParen, &TokenKind::RParen);
                }
                // The underlying type of an enum is not a base.
                if kind != HostTypeKind::Enum {
                    ty.bases.push(base);
                }
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        while self.check(&TokenKind::Where) {
            while !matches!(
                self.peek(),
                TokenKind::LBrace | TokenKind::Semicolon | TokenKind::Eof
            ) {
                self.advance();
            }
        }

        if self.matches(&TokenKind::Semicolon) {
            return Ok(ty);
        }
        self.expect(&TokenKind::LBrace)?;
        match kind {
            HostTypeKind::Enum => self.parse_enum_body(&mut ty)?,
            HostTypeKind::Interface => self.skip_until_close(&TokenKind::LBrace, &TokenKind::RBrace),
            HostTypeKind::Class => self.parse_class_body(&mut ty)?,
        }
        self.matches(&TokenKind::Semicolon);
        Ok(ty)
    }

    fn parse_record_parameters(&mut self) -> ParseResult<Vec<HostMember>> {
        self.expect(&TokenKind::LParen)?;
        let mut members = Vec::new();
        if self.matches(&TokenKind::RParen) {
            return Ok(members);
        }
        loop {
            let attributes = self.parse_attribute_lists()?;
            while matches!(self.peek(), TokenKind::Ident(word) if matches!(word.as_str(), "ref" | "out" | "in" | "params"))
                || self.check(&TokenKind::This)
            {
                self.advance();
            }
            let start = self.current().start;
            self.parse_type()?;
            let type_name = self.text_since(start).to_string();
            let name = self.expect_ident()?;
            if self.matches(&TokenKind::Eq) {
                self.skip_expression(true);
            }
            members.push(HostMember {
                name,
                type_name,
                attributes,
                ..HostMember::default()
            });
            if self.matches(&TokenKind::RParen) {
                return Ok(members);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    fn parse_enum_body(&mut self, ty: &mut HostType) -> ParseResult<()> {
        loop {
            let mut docs = self.docs_here();
            let attributes = self.parse_attribute_lists()?;
            if docs.is_empty() {
                docs = self.docs_here();
            }
            if self.matches(&TokenKind::RBrace) {
                return Ok(());
            }
            let name = self.expect_ident()?;
            let init = if self.matches(&TokenKind::Eq) {
                let start = self.current().start;
                self.skip_expression(false);
                Some(self.text_since(start).to_string())
            } else {
                None
            };
            ty.members.push(HostMember {
                name,
                init,
                summary: doc_summary(&docs),
                attributes,
                ..HostMember::default()
            });
            if !self.matches(&TokenKind::Comma) {
                self.expect(&TokenKind::RBrace)?;
                return Ok(());
            }
        }
    }

    fn parse_class_body(&mut self, ty: &mut HostType) -> ParseResult<()> {
        loop {
            let mut docs = self.docs_here();
            match self.peek() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Eof => return Err(self.error(format!("unterminated type `{}`", ty.name))),
                TokenKind::Semicolon => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let attributes = self.parse_attribute_lists()?;
            if docs.is_empty() {
                docs = self.docs_here();
            }
            let modifiers = self.parse_modifiers();

            match self.peek() {
                TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Enum => {
                    let nested = self.parse_type_declaration(&ty.namespace, docs, attributes)?;
                    ty.nested.push(nested);
                    continue;
                }
                TokenKind::Record if matches!(self.peek_nth(1), TokenKind::Ident(_) | TokenKind::Class | TokenKind::Struct) => {
                    let nested = self.parse_type_declaration(&ty.namespace, docs, attributes)?;
                    ty.nested.push(nested);
                    continue;
                }
                TokenKind::Delegate
                | TokenKind::Event
                | TokenKind::Operator
                | TokenKind::Implicit
                | TokenKind::Explicit
                | TokenKind::Tilde => {
                    self.skip_member();
                    continue;
                }
                TokenKind::Ident(name) if *name == ty.name && self.peek_nth(1) == &TokenKind::LParen => {
                    // Constructor.
                    self.skip_member();
                    continue;
                }
                _ => {}
            }

            let start = self.current().start;
            self.parse_type()?;
            let type_name = self.text_since(start).to_string();

            if matches!(self.peek(), TokenKind::This | TokenKind::Operator) {
                self.skip_member();
                continue;
            }
            let name = self.expect_ident()?;
            let summary = doc_summary(&docs);

            match self.peek() {
                TokenKind::LParen | TokenKind::LAngle | TokenKind::Dot => {
                    // Methods and explicit interface implementations.
                    self.skip_member();
                }
                TokenKind::LBrace => {
                    self.advance();
                    let readable = self.parse_accessors()?;
                    if self.matches(&TokenKind::Eq) {
                        self.skip_expression(true);
                        self.expect(&TokenKind::Semicolon)?;
                    }
                    if readable && modifiers.exported() {
                        ty.members.push(HostMember {
                            name,
                            type_name,
                            summary,
                            attributes,
                            ..HostMember::default()
                        });
                    }
                }
                TokenKind::Arrow => {
                    self.skip_member();
                    if modifiers.exported() {
                        ty.members.push(HostMember {
                            name,
                            type_name,
                            summary,
                            attributes,
                            ..HostMember::default()
                        });
                    }
                }
                TokenKind::Eq | TokenKind::Semicolon | TokenKind::Comma => {
                    let mut names = vec![name];
                    loop {
                        if self.matches(&TokenKind::Eq) {
                            self.skip_expression(true);
                        }
                        if self.matches(&TokenKind::Comma) {
                            names.push(self.expect_ident()?);
                        } else {
                            self.expect(&TokenKind::Semicolon)?;
                            break;
                        }
                    }
                    if modifiers.exported() {
                        for name in names {
                            ty.members.push(HostMember {
                                name,
                                type_name: type_name.clone(),
                                summary: summary.clone(),
                                attributes: attributes.clone(),
                                ..HostMember::default()
                            });
                        }
                    }
                }
                other => {
                    return Err(self.error(format!(
                        "unexpected {other:?} after member `{name}`"
                    )))
                }
            }
        }
    }

    /// Parse `get; set;` style accessor lists up to and including the
    /// closing brace. Returns whether a publicly readable getter exists.
    fn parse_accessors(&mut self) -> ParseResult<bool> {
        let mut readable = false;
        loop {
            if self.matches(&TokenKind::RBrace) {
                return Ok(readable);
            }
            if self.check(&TokenKind::Eof) {
                return Err(self.error("unterminated accessor list"));
            }
            self.parse_attribute_lists()?;
            let modifiers = self.parse_modifiers();
            let accessor = self.expect_ident()?;
            if accessor == "get" && !modifiers.restricted {
                readable = true;
            }
            match self.peek() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Arrow | TokenKind::LBrace => self.skip_member(),
                other => {
                    return Err(self.error(format!(
                        "unexpected {other:?} in accessor `{accessor}`"
                    )))
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn parse_attribute_lists(&mut self) -> ParseResult<Vec<HostAttribute>> {
        let mut attributes = Vec::new();
        while self.matches(&TokenKind::LBracket) {
            // Optional target: `[property: JsonPropertyName("x")]`.
            if matches!(self.peek(), TokenKind::Ident(_)) && self.peek_nth(1) == &TokenKind::Colon {
                self.advance();
                self.advance();
            }
            loop {
                let name = self.parse_qualified_name()?;
                let args = if self.matches(&TokenKind::LParen) {
                    self.parse_attribute_args()?
                } else {
                    Vec::new()
                };
                attributes.push(HostAttribute { name, args });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket)?;
        }
        Ok(attributes)
    }

    fn parse_attribute_args(&mut self) -> ParseResult<Vec<AttributeArg>> {
        let mut args = Vec::new();
        if self.matches(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            let name = match (self.peek(), self.peek_nth(1)) {
                (TokenKind::Ident(name), TokenKind::Eq | TokenKind::Colon) => {
                    let name = name.clone();
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            let value = match (self.peek(), self.peek_nth(1)) {
                (TokenKind::StringLiteral(text), TokenKind::Comma | TokenKind::RParen) => {
                    let text = text.clone();
                    self.advance();
                    text
                }
                _ => {
                    let start = self.current().start;
                    self.skip_expression(true);
                    self.text_since(start).to_string()
                }
            };
            args.push(AttributeArg { name, value });
            if self.matches(&TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> ParseResult<TypeSyntax> {
        let mut ty = if self.matches(&TokenKind::LParen) {
            let mut items = Vec::new();
            loop {
                items.push(self.parse_type()?);
                // Tuple element names are irrelevant.
                if matches!(self.peek(), TokenKind::Ident(_)) {
                    self.advance();
                }
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                self.expect(&TokenKind::Comma)?;
            }
            TypeSyntax::Tuple(items)
        } else {
            self.parse_named_type()?
        };

        loop {
            match self.peek() {
                TokenKind::Question if !matches!(ty, TypeSyntax::Nullable(_)) => {
                    self.advance();
                    ty = TypeSyntax::Nullable(Box::new(ty));
                }
                TokenKind::LBracket
                    if matches!(self.peek_nth(1), TokenKind::RBracket | TokenKind::Comma) =>
                {
                    self.advance();
                    while self.matches(&TokenKind::Comma) {}
                    self.expect(&TokenKind::RBracket)?;
                    ty = TypeSyntax::Array(Box::new(ty));
                }
                TokenKind::Star => {
                    // Pointers only appear in unsafe code; keep the pointee.
                    self.advance();
                }
                _ => return Ok(ty),
            }
        }
    }

    fn parse_named_type(&mut self) -> ParseResult<TypeSyntax> {
        if self.is_ident("global") && self.peek_nth(1) == &TokenKind::ColonColon {
            self.advance();
            self.advance();
        }
        let mut name = self.expect_ident()?;
        let mut args = Vec::new();
        loop {
            if self.matches(&TokenKind::LAngle) {
                args = self.parse_type_args()?;
            }
            if self.check(&TokenKind::Dot) && matches!(self.peek_nth(1), TokenKind::Ident(_)) {
                self.advance();
                name.push('.');
                name.push_str(&self.expect_ident()?);
                args.clear();
            } else if self.matches(&TokenKind::ColonColon) {
                name.push('.');
                name.push_str(&self.expect_ident()?);
            } else {
                return Ok(TypeSyntax::Named { name, args });
            }
        }
    }

    fn parse_type_args(&mut self) -> ParseResult<Vec<TypeSyntax>> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if self.matches(&TokenKind::RAngle) {
                return Ok(args);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    // ------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------

    /// Skip tokens after an opening delimiter up to its matching close.
    fn skip_until_close(&mut self, open: &TokenKind, close: &TokenKind) {
        let mut depth = 1usize;
        loop {
            if self.check(&TokenKind::Eof) {
                return;
            }
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    return;
                }
            }
            self.advance();
        }
    }

    /// Skip a member we do not translate: up to a `;` or past a body block.
    fn skip_member(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace if depth == 0 => {
                    self.advance();
                    self.skip_until_close(&TokenKind::LBrace, &TokenKind::RBrace);
                    self.matches(&TokenKind::Semicolon);
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip an expression up to a `,`, `;`, `)` or `}` at nesting depth zero,
    /// leaving the terminator in place. With `generics`, a `<` directly after
    /// an identifier opens a type argument list whose commas are not
    /// terminators.
    fn skip_expression(&mut self, generics: bool) {
        let mut depth = 0usize;
        let mut angles = 0usize;
        let mut after_ident = false;
        loop {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::LAngle if generics && after_ident => angles += 1,
                TokenKind::RAngle if angles > 0 => angles -= 1,
                TokenKind::Comma | TokenKind::Semicolon if depth == 0 && angles == 0 => return,
                _ => {}
            }
            after_ident = matches!(self.peek(), TokenKind::Ident(_));
            self.advance();
        }
    }
}

/// Extract readable text from `///` doc comment lines: the `<summary>`
/// element when present, with tags stripped and entities decoded.
fn doc_summary(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let xml = lines.join("\n");
    let body = match (xml.find("<summary>"), xml.find("</summary>")) {
        (Some(open), Some(close)) if close > open => &xml[open + "<summary>".len()..close],
        (Some(_), _) => return None,
        _ if xml.trim_start().starts_with('<') => return None,
        _ => xml.as_str(),
    };

    let mut text = String::new();
    let mut rest = body;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = &rest[open..];
            break;
        };
        let tag = &rest[open + 1..open + close];
        if let Some(reference) = cref_name(tag) {
            text.push_str(reference);
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);

    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// `see cref="T:App.Models.Person"` -> `Person`.
fn cref_name(tag: &str) -> Option<&str> {
    let start = tag.find("cref=\"").or_else(|| tag.find("langword=\""))?;
    let value = &tag[tag[start..].find('"')? + start + 1..];
    let value = &value[..value.find('"')?];
    value.rsplit(['.', ':']).next()
}
