/// Recursive-descent parser over the header token stream
///
/// The parser is tolerant: it only insists on well-formed `@interface`,
/// `@protocol` and `@implementation` containers and skips whatever it does
/// not model (C declarations, method bodies, unknown attributes).

use crate::ast::*;
use mixin_lexer::{LineIndex, Token, TokenKind, lex_str};
use std::ops::Range;
use thiserror::Error;

/// Tag that marks an `annotate(...)` payload as a provide annotation
pub const PROVIDE_TAG: &str = "__provide__";

/// Error type for the parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{line}:{column}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

/// Options controlling how declarations are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Function-like macro that expands to a provide annotation
    pub annotation_macro: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            annotation_macro: "PROVIDE".to_string(),
        }
    }
}

impl ParseOptions {
    pub fn annotation_macro(mut self, name: impl Into<String>) -> Self {
        self.annotation_macro = name.into();
        self
    }
}

/// Parse a header with explicit options
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<TranslationUnit, ParseError> {
    Parser::new(input, options).parse_unit()
}

/// Declarator split into type, name and trailing annotations
struct Declarator {
    ty: String,
    name: String,
    name_index: usize,
    /// One past the last token of the declarator proper
    end: usize,
    annotations: Vec<Annotation>,
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    lines: LineIndex,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            input,
            tokens: lex_str(input).collect(),
            pos: 0,
            lines: LineIndex::new(input),
            options,
        }
    }

    fn parse_unit(mut self) -> Result<TranslationUnit, ParseError> {
        let mut items = Vec::new();

        while let Some(token) = self.tokens.get(self.pos) {
            let (kind, text) = (token.kind, token.text);
            match (kind, text) {
                (TokenKind::Directive, _) => {
                    if let Some(import) = import_directive(token) {
                        items.push(Item::Import(import));
                    }
                    self.pos += 1;
                }
                (TokenKind::AtKeyword, "@interface") => items.push(self.interface()?),
                (TokenKind::AtKeyword, "@protocol") => {
                    if let Some(protocol) = self.protocol()? {
                        items.push(Item::Protocol(protocol));
                    }
                }
                (TokenKind::AtKeyword, "@implementation") => {
                    items.push(Item::Implementation(self.implementation()?));
                }
                _ => self.pos += 1,
            }
        }

        Ok(TranslationUnit { items })
    }

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------

    fn interface(&mut self) -> Result<Item, ParseError> {
        let start = self.expect_at_keyword("@interface")?.span.start;
        let name = self.expect_ident("class name")?;

        if self.eat(TokenKind::LParen) {
            let category = if self.at(TokenKind::Ident) {
                self.bump_text()
            } else {
                String::new()
            };
            self.expect(TokenKind::RParen, "`)`")?;
            let protocols = self.protocol_list()?;
            let ivars = self.ivar_block()?;
            let members = self.members()?;
            let end = self.expect_at_keyword("@end")?.span.end;

            return Ok(Item::Category(CategoryDecl {
                class_name: name,
                name: category,
                protocols,
                ivars,
                members,
                span: start..end,
            }));
        }

        let mut generic_params = Vec::new();
        let mut protocols = Vec::new();
        if self.at(TokenKind::Lt) {
            // `Name<T> : Super` declares generics, `Name <P>` is a root class
            // adopting protocols
            let list = self.angle_list()?;
            if self.at(TokenKind::Colon) {
                generic_params = list;
            } else {
                protocols = list;
            }
        }

        let superclass = if self.eat(TokenKind::Colon) {
            let superclass = self.expect_ident("superclass name")?;
            protocols = self.protocol_list()?;
            Some(superclass)
        } else {
            None
        };

        let ivars = self.ivar_block()?;
        let members = self.members()?;
        let end = self.expect_at_keyword("@end")?.span.end;

        Ok(Item::Interface(InterfaceDecl {
            name,
            generic_params,
            superclass,
            protocols,
            ivars,
            members,
            span: start..end,
        }))
    }

    fn protocol(&mut self) -> Result<Option<ProtocolDecl>, ParseError> {
        let start = self.expect_at_keyword("@protocol")?.span.start;

        // `@protocol(Foo)` expression
        if !self.at(TokenKind::Ident) {
            self.declaration_tokens();
            return Ok(None);
        }

        let name = self.bump_text();

        // Forward declaration: `@protocol Foo;` or `@protocol Foo, Bar;`
        if matches!(
            self.peek_kind(),
            Some(TokenKind::Comma) | Some(TokenKind::Semicolon)
        ) {
            self.declaration_tokens();
            return Ok(None);
        }

        let parents = self.protocol_list()?;
        let members = self.members()?;
        let end = self.expect_at_keyword("@end")?.span.end;

        Ok(Some(ProtocolDecl {
            name,
            parents,
            members,
            span: start..end,
        }))
    }

    fn implementation(&mut self) -> Result<ImplementationDecl, ParseError> {
        let start = self.expect_at_keyword("@implementation")?.span.start;
        let class_name = self.expect_ident("class name")?;

        let category = if self.eat(TokenKind::LParen) {
            let category = if self.at(TokenKind::Ident) {
                self.bump_text()
            } else {
                String::new()
            };
            self.expect(TokenKind::RParen, "`)`")?;
            Some(category)
        } else {
            None
        };

        if self.eat(TokenKind::Colon) {
            self.expect_ident("superclass name")?;
        }

        let ivars = self.ivar_block()?;

        // Method bodies are not modelled
        loop {
            match self.tokens.get(self.pos) {
                None => return Err(self.error_here("`@end`")),
                Some(token) if token.is_at_keyword("@end") => break,
                Some(_) => self.pos += 1,
            }
        }
        let end = self.expect_at_keyword("@end")?.span.end;

        Ok(ImplementationDecl {
            class_name,
            category,
            ivars,
            span: start..end,
        })
    }

    /// Members up to (not including) the closing `@end`
    fn members(&mut self) -> Result<Vec<MemberDecl>, ParseError> {
        let mut members = Vec::new();
        let mut optional = false;

        loop {
            let (kind, text) = match self.tokens.get(self.pos) {
                Some(token) => (token.kind, token.text),
                None => return Err(self.error_here("`@end`")),
            };

            match (kind, text) {
                (TokenKind::AtKeyword, "@end") => return Ok(members),
                (TokenKind::AtKeyword, "@optional") => {
                    optional = true;
                    self.pos += 1;
                }
                (TokenKind::AtKeyword, "@required") => {
                    optional = false;
                    self.pos += 1;
                }
                (TokenKind::AtKeyword, "@property") => {
                    if let Some(property) = self.property(optional)? {
                        members.push(MemberDecl::Property(property));
                    }
                }
                (TokenKind::Minus | TokenKind::Plus, _) => {
                    members.push(MemberDecl::Method(self.method(optional)?));
                }
                (TokenKind::Directive | TokenKind::Semicolon, _) => self.pos += 1,
                _ => {
                    let before = self.pos;
                    self.declaration_tokens();
                    if self.pos == before {
                        self.pos += 1;
                    }
                }
            }
        }
    }

    fn ivar_block(&mut self) -> Result<Vec<IvarDecl>, ParseError> {
        let mut ivars = Vec::new();

        if !self.eat(TokenKind::LBrace) {
            return Ok(ivars);
        }

        loop {
            match self.peek_kind() {
                None => return Err(self.error_here("`}`")),
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    return Ok(ivars);
                }
                // visibility keywords, pragmas, stray semicolons
                Some(TokenKind::AtKeyword | TokenKind::Directive | TokenKind::Semicolon) => {
                    self.pos += 1;
                }
                Some(_) => {
                    let before = self.pos;
                    let range = self.declaration_tokens();
                    if self.pos == before {
                        self.pos += 1;
                        continue;
                    }
                    let span = self.span_of(range.clone());
                    if let Some(declarator) = self.declarator(range) {
                        ivars.push(IvarDecl {
                            ty: declarator.ty,
                            name: declarator.name,
                            annotations: declarator.annotations,
                            span,
                        });
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn method(&mut self, optional: bool) -> Result<MethodDecl, ParseError> {
        let sigil = self.bump().ok_or_else(|| self.error_here("`-` or `+`"))?;
        let is_class = sigil.kind == TokenKind::Plus;
        let start = sigil.span.start;

        let return_type = if self.at(TokenKind::LParen) {
            let inner = self.parenthesized()?;
            self.spelling(inner)
        } else {
            "id".to_string()
        };

        let first = if self.at(TokenKind::Ident) {
            self.bump_text()
        } else {
            String::new()
        };

        let mut selector = String::new();
        let mut params = Vec::new();

        if self.at(TokenKind::Colon) {
            let mut label = first;
            loop {
                self.expect(TokenKind::Colon, "`:`")?;
                let ty = if self.at(TokenKind::LParen) {
                    let inner = self.parenthesized()?;
                    self.spelling(inner)
                } else {
                    "id".to_string()
                };
                let name = self.expect_ident("parameter name")?;

                selector.push_str(&label);
                selector.push(':');
                params.push(ParamDecl { label, ty, name });

                if self.at(TokenKind::Colon) {
                    label = String::new();
                } else if self.at(TokenKind::Ident) && self.nth_kind(1) == Some(TokenKind::Colon) {
                    label = self.bump_text();
                } else {
                    break;
                }
            }
        } else if first.is_empty() {
            return Err(self.error_here("selector"));
        } else {
            selector = first;
        }

        let mut variadic = false;
        if self.at(TokenKind::Comma) && self.nth_kind(1) == Some(TokenKind::Ellipsis) {
            self.pos += 2;
            variadic = true;
        }

        let text_end = self.tokens[self.pos - 1].span.end;
        let text = self.input[start..text_end].to_string();

        // trailing attributes and macros up to `;`
        self.declaration_tokens();
        let end = self.tokens[self.pos - 1].span.end;

        Ok(MethodDecl {
            is_class,
            return_type,
            selector,
            params,
            variadic,
            optional,
            text,
            span: start..end,
        })
    }

    fn property(&mut self, optional: bool) -> Result<Option<PropertyDecl>, ParseError> {
        let start = self.expect_at_keyword("@property")?.span.start;

        let attributes = if self.at(TokenKind::LParen) {
            let inner = self.parenthesized()?;
            self.property_attributes(inner)
        } else {
            Vec::new()
        };

        let range = self.declaration_tokens();
        let end = self.span_of(range.clone()).end.max(start);
        let Some(declarator) = self.declarator(range) else {
            return Ok(None);
        };

        let name_start = self.tokens[declarator.name_index].span.start;
        let text_end = self.tokens[declarator.end - 1].span.end;

        Ok(Some(PropertyDecl {
            attributes,
            ty: declarator.ty,
            name: declarator.name,
            annotations: declarator.annotations,
            optional,
            text: self.input[start..text_end].to_string(),
            name_offset: name_start - start,
            span: start..end,
        }))
    }

    fn property_attributes(&self, range: Range<usize>) -> Vec<PropertyAttribute> {
        let mut attributes = Vec::new();
        let mut part_start = range.start;

        for index in range.start..=range.end {
            let at_boundary =
                index == range.end || self.tokens[index].kind == TokenKind::Comma;
            if !at_boundary {
                continue;
            }

            if part_start < index {
                attributes.push(self.property_attribute(part_start..index));
            }
            part_start = index + 1;
        }

        attributes
    }

    fn property_attribute(&self, part: Range<usize>) -> PropertyAttribute {
        let head = &self.tokens[part.start];
        let has_value = part.len() > 2 && self.tokens[part.start + 1].kind == TokenKind::Eq;

        match head.text {
            "readonly" => PropertyAttribute::Readonly,
            "readwrite" => PropertyAttribute::Readwrite,
            "class" => PropertyAttribute::Class,
            "getter" if has_value => PropertyAttribute::Getter(self.spelling(part.start + 2..part.end)),
            "setter" if has_value => PropertyAttribute::Setter(self.spelling(part.start + 2..part.end)),
            _ => PropertyAttribute::Other(self.spelling(part)),
        }
    }

    /// Split a field declaration into type, name and trailing annotations.
    ///
    /// Annotations and attribute macros are peeled off from the end; the
    /// last remaining identifier is the name.
    fn declarator(&self, range: Range<usize>) -> Option<Declarator> {
        let start = range.start;
        let mut end = range.end;
        let mut annotations = Vec::new();

        while end > start {
            let last = &self.tokens[end - 1];
            match last.kind {
                TokenKind::RParen => {
                    let open = self.matching_open(start, end - 1)?;
                    if open <= start || self.tokens[open - 1].kind != TokenKind::Ident {
                        break;
                    }

                    let callee = &self.tokens[open - 1];
                    if callee.text == self.options.annotation_macro {
                        annotations.push(Annotation {
                            value: format!("{} {}", PROVIDE_TAG, self.spelling(open + 1..end - 1)),
                            span: callee.span.start..last.span.end,
                        });
                    } else if callee.text == "__attribute__" {
                        let group = self.annotate_attributes(open..end);
                        annotations.extend(group.into_iter().rev());
                    }
                    end = open - 1;
                }
                TokenKind::Ident
                    if is_attribute_macro(last.text)
                        && end > start + 2
                        && self.tokens[end - 2].kind == TokenKind::Ident =>
                {
                    end -= 1;
                }
                _ => break,
            }
        }

        annotations.reverse();

        if end <= start {
            return None;
        }

        let last = &self.tokens[end - 1];
        if last.kind == TokenKind::Ident && end - 1 > start {
            return Some(Declarator {
                ty: self.spelling(start..end - 1),
                name: last.text.to_string(),
                name_index: end - 1,
                end,
                annotations,
            });
        }

        // block or function pointer: `void (^name)(int)`
        let name_index = (start + 1..end.saturating_sub(1)).find(|&i| {
            matches!(self.tokens[i].kind, TokenKind::Caret | TokenKind::Star)
                && self.tokens[i - 1].kind == TokenKind::LParen
                && self.tokens[i + 1].kind == TokenKind::Ident
        })? + 1;

        let ty = self.spelling(start..name_index) + &self.spelling(name_index + 1..end);
        Some(Declarator {
            ty,
            name: self.tokens[name_index].text.to_string(),
            name_index,
            end,
            annotations,
        })
    }

    /// `annotate("...")` payloads inside an `__attribute__((...))` group
    fn annotate_attributes(&self, range: Range<usize>) -> Vec<Annotation> {
        let mut found = Vec::new();

        for index in range.clone() {
            let token = &self.tokens[index];
            if !token.is_ident("annotate") || index + 2 >= range.end {
                continue;
            }
            let (open, literal) = (&self.tokens[index + 1], &self.tokens[index + 2]);
            if open.kind == TokenKind::LParen && literal.kind == TokenKind::String {
                found.push(Annotation {
                    value: unescape(literal.text),
                    span: token.span.start..literal.span.end,
                });
            }
        }

        found
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn bump_text(&mut self) -> String {
        self.bump().map(|t| t.text.to_string()).unwrap_or_default()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'a>, ParseError> {
        if self.at(kind) {
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        Err(self.error_here(what))
    }

    fn expect_at_keyword(&mut self, word: &str) -> Result<Token<'a>, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) if token.is_at_keyword(word) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_here(&format!("`{}`", word))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        self.expect(TokenKind::Ident, what).map(|t| t.text.to_string())
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => {
                let (line, column) = self.lines.line_col(token.span.start);
                ParseError::UnexpectedToken {
                    expected: expected.to_string(),
                    found: token.text.to_string(),
                    line,
                    column,
                }
            }
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Consume a balanced `( ... )` group, returning the inner token range
    fn parenthesized(&mut self) -> Result<Range<usize>, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let start = self.pos;
        let mut depth = 0usize;

        loop {
            match self.peek_kind() {
                None => return Err(self.error_here("`)`")),
                Some(TokenKind::LParen) => depth += 1,
                Some(TokenKind::RParen) if depth == 0 => {
                    let end = self.pos;
                    self.pos += 1;
                    return Ok(start..end);
                }
                Some(TokenKind::RParen) => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Consume `< ... >`, returning the leading identifier of each entry
    fn angle_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::Lt, "`<`")?;
        let mut names = Vec::new();
        let mut current: Option<String> = None;
        let mut depth = 0usize;

        loop {
            let token = self.bump().ok_or_else(|| self.error_here("`>`"))?;
            match token.kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt if depth == 0 => {
                    names.extend(current.take());
                    return Ok(names);
                }
                TokenKind::Gt => depth -= 1,
                TokenKind::Comma if depth == 0 => names.extend(current.take()),
                TokenKind::Ident
                    if depth == 0 && current.is_none() && !token.text.starts_with("__") =>
                {
                    current = Some(token.text.to_string());
                }
                _ => {}
            }
        }
    }

    fn protocol_list(&mut self) -> Result<Vec<String>, ParseError> {
        if self.at(TokenKind::Lt) {
            self.angle_list()
        } else {
            Ok(Vec::new())
        }
    }

    /// Tokens up to the next `;` at nesting depth zero; the `;` is consumed
    /// but excluded. Stops early at an unbalanced `}` or at `@end`.
    fn declaration_tokens(&mut self) -> Range<usize> {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                TokenKind::Semicolon if depth == 0 => {
                    let end = self.pos;
                    self.pos += 1;
                    return start..end;
                }
                TokenKind::AtKeyword if depth == 0 && token.text == "@end" => break,
                _ => {}
            }
            self.pos += 1;
        }

        start..self.pos
    }

    fn matching_open(&self, floor: usize, close: usize) -> Option<usize> {
        let mut depth = 0usize;
        for index in (floor..=close).rev() {
            match self.tokens[index].kind {
                TokenKind::RParen => depth += 1,
                TokenKind::LParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Source span covered by a token range
    fn span_of(&self, range: Range<usize>) -> Span {
        if range.is_empty() {
            let offset = self.tokens.get(range.start).map_or(self.input.len(), |t| t.span.start);
            return offset..offset;
        }
        self.tokens[range.start].span.start..self.tokens[range.end - 1].span.end
    }

    /// Token texts joined with one space wherever the source had a gap
    fn spelling(&self, indices: impl IntoIterator<Item = usize>) -> String {
        let mut out = String::new();
        let mut previous_end: Option<usize> = None;

        for index in indices {
            let token = &self.tokens[index];
            if let Some(end) = previous_end {
                if token.span.start > end {
                    out.push(' ');
                }
            }
            out.push_str(token.text);
            previous_end = Some(token.span.end);
        }

        out
    }
}

fn import_directive(token: &Token<'_>) -> Option<ImportDecl> {
    let body = token.text.strip_prefix('#')?.trim_start();
    let rest = body
        .strip_prefix("import")
        .or_else(|| body.strip_prefix("include"))?
        .trim_start();

    let (system, close) = match rest.chars().next()? {
        '"' => (false, '"'),
        '<' => (true, '>'),
        _ => return None,
    };
    let path = &rest[1..];
    let end = path.find(close)?;

    Some(ImportDecl {
        path: path[..end].to_string(),
        system,
        span: token.span.clone(),
    })
}

/// Attribute-like macros such as `NS_REQUIRES_SUPER` or `__deprecated`
fn is_attribute_macro(text: &str) -> bool {
    text.starts_with("__")
        || (text.len() > 1
            && text.contains('_')
            && text
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
}

/// Contents of a C string literal with simple escapes resolved
fn unescape(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
