//! Parser types and utilities.

use crate::lex::{lex, SyntaxKind};
use crate::PositionedParseError;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// The result of a parse operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse<T> {
    green_node: GreenNode,
    errors: Vec<String>,
    positioned_errors: Vec<PositionedParseError>,
    _ty: std::marker::PhantomData<fn() -> T>,
}

impl<T> Parse<T> {
    pub(crate) fn new_with_positioned_errors(
        green_node: GreenNode,
        errors: Vec<String>,
        positioned_errors: Vec<PositionedParseError>,
    ) -> Self {
        Parse {
            green_node,
            errors,
            positioned_errors,
            _ty: std::marker::PhantomData,
        }
    }

    /// The parse tree. If there were no parse errors, this is a valid tree.
    /// If there were parse errors, this tree might be only partially valid.
    pub fn tree(&self) -> T
    where
        T: From<rowan::SyntaxNode<crate::Lang>>,
    {
        let syntax_node = rowan::SyntaxNode::new_root_mut(self.green_node.clone());
        T::from(syntax_node)
    }

    /// Parse errors, if any.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Positioned parse errors with location information.
    pub fn positioned_errors(&self) -> &[PositionedParseError] {
        &self.positioned_errors
    }

    /// Convert parse result to Result, failing if there are any errors.
    pub fn to_result(self) -> Result<T, crate::ParseError>
    where
        T: From<rowan::SyntaxNode<crate::Lang>>,
    {
        if !self.errors.is_empty() {
            Err(crate::ParseError(self.errors))
        } else {
            Ok(self.tree())
        }
    }

    /// Whether the parse had any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Parse<crate::Yaml> {
    /// Parse YAML text, returning a Parse result
    pub fn parse_yaml(text: &str) -> Self {
        let parsed = parse(text);
        Parse::new_with_positioned_errors(
            parsed.green_node,
            parsed.errors,
            parsed.positioned_errors,
        )
    }
}

/// Raw output of the parser.
pub(crate) struct ParsedYaml {
    pub green_node: GreenNode,
    pub errors: Vec<String>,
    pub positioned_errors: Vec<PositionedParseError>,
}

/// Parse text into a lossless green tree.
pub(crate) fn parse(text: &str) -> ParsedYaml {
    Parser::new(text).parse()
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: SyntaxKind,
    text: &'a str,
    offset: usize,
    column: usize,
}

/// Internal parser state
struct Parser<'a> {
    source: &'a str,
    /// Remaining tokens in reverse order, so the current token is the last one
    tokens: Vec<Token<'a>>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<String>,
    positioned_errors: Vec<PositionedParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut offset = 0;
        let mut column = 0;
        for (kind, text) in lex(source) {
            tokens.push(Token {
                kind,
                text,
                offset,
                column,
            });
            offset += text.len();
            match text.rfind(['\n', '\r']) {
                Some(pos) => column = text[pos + 1..].chars().count(),
                None => column += text.chars().count(),
            }
        }

        // Reverse tokens so we can use pop() to get the next token
        tokens.reverse();

        Self {
            source,
            tokens,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            positioned_errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParsedYaml {
        self.check_tab_indentation();
        self.builder.start_node(SyntaxKind::ROOT.into());

        loop {
            self.bump_while(|kind| kind.is_trivia() || kind == SyntaxKind::DIRECTIVE);
            if self.current().is_none() {
                break;
            }
            self.parse_document();
        }

        self.builder.finish_node();

        ParsedYaml {
            green_node: self.builder.finish(),
            errors: self.errors,
            positioned_errors: self.positioned_errors,
        }
    }

    fn parse_document(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(DOCUMENT.into());

        match self.current() {
            Some(DOC_START) => {
                self.bump();
                self.parse_value(-1, false);
            }
            Some(DOC_END) | None => {}
            Some(_) => self.parse_block_node(-1),
        }

        loop {
            self.bump_while(SyntaxKind::is_trivia);
            match self.current() {
                None | Some(DOC_START) => break,
                Some(DOC_END) => {
                    self.bump();
                    self.bump_while(|kind| matches!(kind, WHITESPACE | COMMENT));
                    break;
                }
                Some(_) => {
                    self.error("unexpected content after the document root", "unexpected-content");
                    self.error_rest_of_line();
                }
            }
        }

        self.builder.finish_node();
    }

    /// Parse the value that follows an indicator (`key:`, `-`, `---` or a node
    /// property). The value either starts on the current line or is a block
    /// node on a following line indented deeper than `parent`.
    fn parse_value(&mut self, parent: isize, in_mapping_value: bool) {
        use SyntaxKind::*;

        let n = self.skip_whitespace_from(0);
        match self.nth_kind(n) {
            Some(kind) if !kind.is_trivia() && !matches!(kind, DOC_START | DOC_END) => {
                self.bump_n(n);
                match kind {
                    ANCHOR | TAG => {
                        self.bump();
                        self.parse_value(parent, in_mapping_value);
                    }
                    DASH if !in_mapping_value => self.parse_block_sequence(self.current_column()),
                    QUESTION if !in_mapping_value => self.parse_block_mapping(self.current_column()),
                    _ if self.is_key_at(0) => {
                        if in_mapping_value {
                            self.error(
                                "mapping values are not allowed on the same line as a key",
                                "nested-mapping-on-key-line",
                            );
                            self.error_rest_of_line();
                        } else {
                            self.parse_block_mapping(self.current_column());
                        }
                    }
                    _ => self.parse_inline_node(parent),
                }
            }
            _ => {
                if let Some((skip, column, kind)) = self.next_line_content() {
                    // A sequence may sit at the same column as the key that owns it
                    let nested = column as isize > parent
                        || (in_mapping_value && kind == DASH && column as isize == parent);
                    if nested && !matches!(kind, DOC_START | DOC_END | DIRECTIVE) {
                        self.bump_n(skip);
                        self.parse_block_node(parent);
                    }
                }
            }
        }
    }

    /// Parse a node that starts at the current token on its own line.
    fn parse_block_node(&mut self, parent: isize) {
        use SyntaxKind::*;

        match self.current() {
            Some(DASH) => self.parse_block_sequence(self.current_column()),
            Some(ANCHOR | TAG) => {
                self.bump();
                self.parse_value(parent, false);
            }
            Some(_) if self.starts_mapping_entry(0) => self.parse_block_mapping(self.current_column()),
            _ => self.parse_inline_node(parent),
        }
    }

    /// Parse a scalar or flow collection that fits on the current line.
    fn parse_inline_node(&mut self, parent: isize) {
        use SyntaxKind::*;

        match self.current() {
            Some(LEFT_BRACKET | LEFT_BRACE) => {
                self.parse_flow_node();
                let n = self.skip_whitespace_from(0);
                if self.nth_kind(n) == Some(COLON) {
                    self.bump_n(n);
                    self.error("implicit keys must fit on one line", "multiline-implicit-key");
                    self.error_rest_of_line();
                }
            }
            Some(BLOCK_SCALAR_HEADER) => self.parse_block_scalar(),
            Some(kind) if kind.is_plain_scalar() => self.parse_plain_scalar(parent),
            Some(SINGLE_QUOTED | DOUBLE_QUOTED | REFERENCE) => self.parse_single_token_scalar(),
            Some(UNTERMINATED_STRING) => {
                self.error("unterminated quoted scalar", "unterminated-string");
                self.parse_single_token_scalar();
            }
            Some(_) => {
                let text = self.nth(0).map_or("", |token| token.text);
                self.error(format!("unexpected '{}'", text), "unexpected-token");
                self.error_rest_of_line();
            }
            None => {}
        }
    }

    fn parse_single_token_scalar(&mut self) {
        self.builder.start_node(SyntaxKind::SCALAR.into());
        self.bump();
        self.builder.finish_node();
    }

    fn parse_plain_scalar(&mut self, parent: isize) {
        self.check_reserved_indicator();
        self.builder.start_node(SyntaxKind::SCALAR.into());
        self.bump();
        while let Some(skip) = self.plain_continuation(parent) {
            self.bump_n(skip + 1);
        }
        self.builder.finish_node();
    }

    /// If the next line continues a multi-line plain scalar, the number of
    /// tokens before the continuation text.
    fn plain_continuation(&self, parent: isize) -> Option<usize> {
        let n = self.skip_whitespace_from(0);
        if self.nth_kind(n) != Some(SyntaxKind::NEWLINE) {
            return None;
        }
        let (skip, column, kind) = self.next_line_content()?;
        let crosses_comment = (0..skip).any(|i| self.nth_kind(i) == Some(SyntaxKind::COMMENT));
        (kind.is_plain_scalar() && column as isize > parent && !crosses_comment && !self.is_key_at(skip))
            .then_some(skip)
    }

    fn parse_block_scalar(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(SCALAR.into());
        self.bump();
        let mut n = self.skip_whitespace_from(0);
        if self.nth_kind(n) == Some(COMMENT) {
            n += 1;
        }
        if self.nth_kind(n) == Some(NEWLINE) && self.nth_kind(n + 1) == Some(BLOCK_SCALAR_TEXT) {
            self.bump_n(n + 2);
        }
        self.builder.finish_node();
    }

    fn parse_block_mapping(&mut self, indent: usize) {
        self.builder.start_node(SyntaxKind::MAPPING.into());
        loop {
            self.parse_mapping_entry(indent);
            if !self.continue_block(indent, |parser, n| parser.starts_mapping_entry(n)) {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn parse_mapping_entry(&mut self, indent: usize) {
        use SyntaxKind::*;

        self.builder.start_node(MAPPING_ENTRY.into());
        if self.current() == Some(QUESTION) {
            self.parse_explicit_entry(indent);
            self.builder.finish_node();
            return;
        }

        self.builder.start_node(KEY.into());
        if matches!(self.current(), Some(LEFT_BRACKET | LEFT_BRACE)) {
            self.parse_flow_node();
        } else {
            self.check_reserved_indicator();
            self.parse_single_token_scalar();
        }
        self.builder.finish_node();

        self.bump_while(|kind| kind == WHITESPACE);
        // COLON, guaranteed by is_key_at
        self.bump();

        let n = self.skip_whitespace_from(0);
        if self.nth_kind(n).map_or(false, |kind| !kind.is_trivia()) {
            self.bump_n(n);
        }

        self.builder.start_node(VALUE.into());
        self.parse_value(indent as isize, true);
        self.builder.finish_node();

        self.trailing_comment();
        self.builder.finish_node();
    }

    /// `? key` with an optional `: value` line at the same column.
    fn parse_explicit_entry(&mut self, indent: usize) {
        use SyntaxKind::*;

        self.builder.start_node(KEY.into());
        // QUESTION
        self.bump();
        self.parse_value(indent as isize, false);
        self.builder.finish_node();
        self.trailing_comment();

        let value_line = self
            .next_line_content()
            .filter(|&(_, column, kind)| kind == COLON && column == indent);
        if let Some((skip, _, _)) = value_line {
            self.bump_n(skip);
            self.bump();
            self.builder.start_node(VALUE.into());
            self.parse_value(indent as isize, false);
            self.builder.finish_node();
            self.trailing_comment();
        }
    }

    fn parse_block_sequence(&mut self, indent: usize) {
        use SyntaxKind::*;

        self.builder.start_node(SEQUENCE.into());
        loop {
            self.builder.start_node(SEQUENCE_ENTRY.into());
            // DASH
            self.bump();
            self.parse_value(indent as isize, false);
            self.trailing_comment();
            self.builder.finish_node();

            if !self.continue_block(indent, |parser, n| parser.nth_kind(n) == Some(DASH)) {
                break;
            }
        }
        self.builder.finish_node();
    }

    /// Move to the next entry of the block collection at `indent`, if there is one.
    fn continue_block(&mut self, indent: usize, starts_entry: impl Fn(&Self, usize) -> bool) -> bool {
        use SyntaxKind::*;

        let n = self.skip_whitespace_from(0);
        if self.nth_kind(n).map_or(false, |kind| !kind.is_trivia()) {
            self.bump_n(n);
            self.error("unexpected content after the entry", "unexpected-content");
            self.error_rest_of_line();
        }

        while let Some((skip, column, kind)) = self.next_line_content() {
            if column == indent && starts_entry(self, skip) {
                self.bump_n(skip);
                return true;
            }
            if column > indent && !matches!(kind, DOC_START | DOC_END) {
                self.bump_n(skip);
                self.error("unexpected indentation", "unexpected-indentation");
                self.error_rest_of_line();
                continue;
            }
            return false;
        }
        false
    }

    fn trailing_comment(&mut self) {
        let n = self.skip_whitespace_from(0);
        if self.nth_kind(n) == Some(SyntaxKind::COMMENT) {
            self.bump_n(n + 1);
        }
    }

    fn parse_flow_node(&mut self) {
        use SyntaxKind::*;

        match self.current() {
            Some(LEFT_BRACKET) => self.parse_flow_sequence(),
            Some(LEFT_BRACE) => self.parse_flow_mapping(),
            Some(ANCHOR | TAG) => {
                self.bump();
                self.bump_while(SyntaxKind::is_trivia);
                self.parse_flow_node();
            }
            Some(kind) if kind.is_plain_scalar() => {
                self.check_reserved_indicator();
                self.builder.start_node(SCALAR.into());
                self.bump();
                // Plain scalars may span lines inside flow collections
                loop {
                    let mut n = 0;
                    let mut crosses_line = false;
                    while let Some(kind @ (WHITESPACE | NEWLINE | INDENT)) = self.nth_kind(n) {
                        crosses_line |= kind == NEWLINE;
                        n += 1;
                    }
                    if crosses_line && self.nth_kind(n).map_or(false, SyntaxKind::is_plain_scalar) {
                        self.bump_n(n + 1);
                    } else {
                        break;
                    }
                }
                self.builder.finish_node();
            }
            Some(SINGLE_QUOTED | DOUBLE_QUOTED | REFERENCE) => self.parse_single_token_scalar(),
            Some(UNTERMINATED_STRING) => {
                self.error("unterminated quoted scalar", "unterminated-string");
                self.parse_single_token_scalar();
            }
            Some(COMMA | RIGHT_BRACKET | RIGHT_BRACE) | None => {}
            Some(_) => {
                let text = self.nth(0).map_or("", |token| token.text);
                self.error(
                    format!("unexpected '{}' in flow collection", text),
                    "unexpected-token",
                );
                self.error_token();
            }
        }
    }

    fn parse_flow_sequence(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(SEQUENCE.into());
        self.bump();
        loop {
            self.bump_while(SyntaxKind::is_trivia);
            match self.current() {
                None => {
                    self.error("unclosed flow sequence", "unclosed-flow-collection");
                    break;
                }
                Some(RIGHT_BRACKET) => {
                    self.bump();
                    break;
                }
                Some(COMMA) => {
                    self.error("unexpected ','", "unexpected-token");
                    self.bump();
                }
                Some(_) => {
                    self.builder.start_node(SEQUENCE_ENTRY.into());
                    self.parse_flow_node();
                    self.builder.finish_node();

                    self.bump_while(SyntaxKind::is_trivia);
                    match self.current() {
                        Some(COMMA) => self.bump(),
                        Some(RIGHT_BRACKET) | None => {}
                        Some(COLON) => {
                            self.error(
                                "single-pair mappings inside flow sequences are not supported",
                                "unsupported-flow-pair",
                            );
                            self.error_token();
                        }
                        Some(_) => {
                            self.error("expected ',' or ']'", "unexpected-token");
                            self.error_token();
                        }
                    }
                }
            }
        }
        self.builder.finish_node();
    }

    fn parse_flow_mapping(&mut self) {
        use SyntaxKind::*;

        self.builder.start_node(MAPPING.into());
        self.bump();
        loop {
            self.bump_while(SyntaxKind::is_trivia);
            match self.current() {
                None => {
                    self.error("unclosed flow mapping", "unclosed-flow-collection");
                    break;
                }
                Some(RIGHT_BRACE) => {
                    self.bump();
                    break;
                }
                Some(COMMA) => {
                    self.error("unexpected ','", "unexpected-token");
                    self.bump();
                }
                Some(_) => {
                    self.builder.start_node(MAPPING_ENTRY.into());

                    self.builder.start_node(KEY.into());
                    self.parse_flow_node();
                    self.builder.finish_node();

                    self.bump_while(SyntaxKind::is_trivia);
                    if self.current() == Some(COLON) {
                        self.bump();
                        self.bump_while(SyntaxKind::is_trivia);
                        self.builder.start_node(VALUE.into());
                        if !matches!(self.current(), Some(COMMA | RIGHT_BRACE) | None) {
                            self.parse_flow_node();
                        }
                        self.builder.finish_node();
                    }
                    self.builder.finish_node();

                    self.bump_while(SyntaxKind::is_trivia);
                    match self.current() {
                        Some(COMMA) => self.bump(),
                        Some(RIGHT_BRACE) | None => {}
                        Some(_) => {
                            self.error("expected ',' or '}'", "unexpected-token");
                            self.error_token();
                        }
                    }
                }
            }
        }
        self.builder.finish_node();
    }

    fn nth(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens
            .len()
            .checked_sub(n + 1)
            .map(|index| &self.tokens[index])
    }

    fn nth_kind(&self, n: usize) -> Option<SyntaxKind> {
        self.nth(n).map(|token| token.kind)
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.nth_kind(0)
    }

    fn current_column(&self) -> usize {
        self.nth(0).map_or(0, |token| token.column)
    }

    fn bump(&mut self) {
        if let Some(token) = self.tokens.pop() {
            self.builder.token(token.kind.into(), token.text);
        }
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn bump_while(&mut self, predicate: impl Fn(SyntaxKind) -> bool) {
        while self.current().map_or(false, &predicate) {
            self.bump();
        }
    }

    fn skip_whitespace_from(&self, mut n: usize) -> usize {
        while self.nth_kind(n) == Some(SyntaxKind::WHITESPACE) {
            n += 1;
        }
        n
    }

    /// Whether token `n` starts an implicit key: a scalar or a one-line flow
    /// collection followed by a mapping colon.
    fn is_key_at(&self, n: usize) -> bool {
        let end = match self.nth_kind(n) {
            Some(kind) if kind.is_scalar() => n + 1,
            Some(SyntaxKind::LEFT_BRACKET | SyntaxKind::LEFT_BRACE) => match self.flow_end(n) {
                Some(end) => end,
                None => return false,
            },
            _ => return false,
        };
        self.nth_kind(self.skip_whitespace_from(end)) == Some(SyntaxKind::COLON)
    }

    /// Whether token `n` starts a block mapping entry, implicit or `? key`.
    fn starts_mapping_entry(&self, n: usize) -> bool {
        self.nth_kind(n) == Some(SyntaxKind::QUESTION) || self.is_key_at(n)
    }

    /// The index just past the flow collection opening at token `n`, if it
    /// closes on the same line.
    fn flow_end(&self, n: usize) -> Option<usize> {
        use SyntaxKind::*;

        let mut depth = 0usize;
        let mut i = n;
        loop {
            match self.nth_kind(i)? {
                LEFT_BRACKET | LEFT_BRACE => depth += 1,
                RIGHT_BRACKET | RIGHT_BRACE => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                NEWLINE => return None,
                _ => {}
            }
            i += 1;
        }
    }

    /// Looks past the rest of the current line for the next line holding
    /// content. Returns the number of tokens to skip to reach it, and the
    /// column and kind of its first token.
    fn next_line_content(&self) -> Option<(usize, usize, SyntaxKind)> {
        let mut crossed_line = false;
        let mut n = 0;
        while let Some(token) = self.nth(n) {
            match token.kind {
                SyntaxKind::NEWLINE => crossed_line = true,
                SyntaxKind::WHITESPACE | SyntaxKind::INDENT | SyntaxKind::COMMENT => {}
                kind => return crossed_line.then_some((n, token.column, kind)),
            }
            n += 1;
        }
        None
    }

    fn error(&mut self, message: impl Into<String>, code: &str) {
        let (offset, len) = self
            .nth(0)
            .map_or((self.source.len(), 0), |token| (token.offset, token.text.len()));
        self.error_at(offset, len, message, code);
    }

    fn error_at(&mut self, offset: usize, len: usize, message: impl Into<String>, code: &str) {
        let line = self.source[..offset].matches('\n').count() + 1;
        let message = format!("line {}: {}", line, message.into());
        let range = TextRange::at(TextSize::from(offset as u32), TextSize::from(len as u32));

        self.errors.push(message.clone());
        self.positioned_errors.push(PositionedParseError {
            message,
            range,
            code: Some(code.to_string()),
        });
    }

    /// Plain scalars cannot start with the reserved indicators `@` and `` ` ``.
    fn check_reserved_indicator(&mut self) {
        if let Some(token) = self.nth(0).copied() {
            if token.kind.is_plain_scalar() && token.text.starts_with(['@', '`']) {
                self.error(
                    format!("'{}' is reserved and cannot start a plain scalar", &token.text[..1]),
                    "reserved-indicator",
                );
            }
        }
    }

    /// Report block lines indented with tabs. Tabs inside flow collections
    /// and block scalar content are fine.
    fn check_tab_indentation(&mut self) {
        use SyntaxKind::*;

        let mut depth = 0usize;
        let mut line_start = true;
        let mut tab_indent = false;
        let mut found = Vec::new();
        for token in self.tokens.iter().rev() {
            match token.kind {
                NEWLINE => {
                    line_start = true;
                    tab_indent = false;
                    continue;
                }
                INDENT if line_start => continue,
                WHITESPACE if line_start => {
                    tab_indent |= token.text.contains('\t');
                    continue;
                }
                COMMENT => {}
                _ if line_start && tab_indent && depth == 0 => found.push(*token),
                _ => {}
            }
            line_start = false;
            match token.kind {
                LEFT_BRACKET | LEFT_BRACE => depth += 1,
                RIGHT_BRACKET | RIGHT_BRACE => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        for token in found {
            self.error_at(
                token.offset,
                token.text.len(),
                "tabs cannot be used for indentation",
                "tab-indentation",
            );
        }
    }

    /// Wrap the rest of the current line in an ERROR node.
    fn error_rest_of_line(&mut self) {
        self.builder.start_node(SyntaxKind::ERROR.into());
        while self.current().map_or(false, |kind| kind != SyntaxKind::NEWLINE) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn error_token(&mut self) {
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump();
        self.builder.finish_node();
    }
}
