//! Lexer for YAML files.

/// Lexical analysis: the variants are different kinds of "tokens", followed
/// by the node kinds the parser builds out of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Structural
    /// Root node of the syntax tree
    ROOT = 0,
    /// A YAML document
    DOCUMENT,
    /// A YAML mapping (block or flow)
    MAPPING,
    /// A key-value pair in a mapping
    MAPPING_ENTRY,
    /// The key of a mapping entry
    KEY,
    /// The value of a mapping entry
    VALUE,
    /// A YAML sequence (block or flow)
    SEQUENCE,
    /// An item in a sequence
    SEQUENCE_ENTRY,
    /// A YAML scalar value
    SCALAR,
    /// Parse error marker
    ERROR,

    // Indicators
    /// Sequence entry indicator '-'
    DASH,
    /// Mapping value indicator ':'
    COLON,
    /// Explicit key indicator '?'
    QUESTION,
    /// Comma ','
    COMMA,
    /// Left bracket '['
    LEFT_BRACKET,
    /// Right bracket ']'
    RIGHT_BRACKET,
    /// Left brace '{'
    LEFT_BRACE,
    /// Right brace '}'
    RIGHT_BRACE,

    // Scalars
    /// Plain scalar that resolves to a string
    STRING,
    /// Plain integer literal
    INT,
    /// Plain float literal
    FLOAT,
    /// Plain boolean literal
    BOOL,
    /// Plain null literal
    NULL,
    /// Single-quoted scalar including its quotes
    SINGLE_QUOTED,
    /// Double-quoted scalar including its quotes
    DOUBLE_QUOTED,
    /// Quoted scalar missing its closing quote
    UNTERMINATED_STRING,
    /// Block scalar header like '|', '>-' or '|2+'
    BLOCK_SCALAR_HEADER,
    /// The indented content lines of a block scalar
    BLOCK_SCALAR_TEXT,

    // Node properties
    /// YAML anchor like '&anchor'
    ANCHOR,
    /// YAML alias like '*anchor'
    REFERENCE,
    /// YAML tag like '!tag'
    TAG,

    // Document structure
    /// YAML directive like '%YAML 1.2'
    DIRECTIVE,
    /// Document start marker '---'
    DOC_START,
    /// Document end marker '...'
    DOC_END,

    // Whitespace and formatting
    /// Spaces and tabs
    WHITESPACE,
    /// Newline characters
    NEWLINE,
    /// Leading spaces that determine structure
    INDENT,
    /// Comments starting with '#'
    COMMENT,
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl SyntaxKind {
    /// Whether this token carries no structure of its own.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::INDENT | SyntaxKind::COMMENT
        )
    }

    /// Whether this token is a plain, unquoted scalar.
    pub fn is_plain_scalar(self) -> bool {
        matches!(
            self,
            SyntaxKind::STRING
                | SyntaxKind::INT
                | SyntaxKind::FLOAT
                | SyntaxKind::BOOL
                | SyntaxKind::NULL
        )
    }

    /// Whether this token is a plain or quoted scalar.
    pub fn is_scalar(self) -> bool {
        self.is_plain_scalar()
            || matches!(self, SyntaxKind::SINGLE_QUOTED | SyntaxKind::DOUBLE_QUOTED)
    }
}

/// Tokenize YAML input.
///
/// The returned token texts concatenate back to `input` exactly.
pub fn lex(input: &str) -> Vec<(SyntaxKind, &str)> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<(SyntaxKind, &'a str)>,
    flow_depth: usize,
    line_start: usize,
    /// Column of the last block indicator (`-`, `?` or `:`) that opens a
    /// node on the current line
    last_indicator_column: Option<usize>,
    /// Column of the first token on the current line that is neither
    /// whitespace nor a block indicator
    first_content_column: Option<usize>,
    /// Parent indentation of a block scalar whose header was seen on this line
    pending_block_scalar: Option<isize>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            flow_depth: 0,
            line_start: 0,
            last_indicator_column: None,
            first_content_column: None,
            pending_block_scalar: None,
        }
    }

    fn run(mut self) -> Vec<(SyntaxKind, &'a str)> {
        use SyntaxKind::*;

        while let Some(ch) = self.peek_char(0) {
            match ch {
                '\n' => self.newline(1),
                '\r' => {
                    if self.input[self.pos + 1..].starts_with('\n') {
                        self.newline(2)
                    } else {
                        self.newline(1)
                    }
                }
                ' ' | '\t' => self.whitespace(),
                '#' if self.at_token_boundary() => {
                    let end = self.line_end(self.pos);
                    self.push(COMMENT, end);
                }
                '-' | '.' if self.pos == self.line_start && self.is_document_marker(ch) => {
                    let kind = if ch == '-' { DOC_START } else { DOC_END };
                    self.push(kind, self.pos + 3);
                }
                '%' if self.pos == self.line_start && self.flow_depth == 0 => {
                    let end = self.line_end(self.pos);
                    self.push(DIRECTIVE, end);
                }
                '-' | '?' | ':' if self.at_block_indicator() => {
                    let kind = match ch {
                        '-' => DASH,
                        '?' => QUESTION,
                        _ => COLON,
                    };
                    self.last_indicator_column = Some(self.column());
                    self.push(kind, self.pos + 1);
                }
                '?' if self.followed_by_blank(1) => self.push(QUESTION, self.pos + 1),
                ':' if self.flow_depth > 0 || self.followed_by_blank(1) => {
                    self.push(COLON, self.pos + 1)
                }
                '[' => {
                    self.flow_depth += 1;
                    self.push(LEFT_BRACKET, self.pos + 1);
                }
                '{' => {
                    self.flow_depth += 1;
                    self.push(LEFT_BRACE, self.pos + 1);
                }
                ']' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    self.push(RIGHT_BRACKET, self.pos + 1);
                }
                '}' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    self.push(RIGHT_BRACE, self.pos + 1);
                }
                ',' if self.flow_depth > 0 => self.push(COMMA, self.pos + 1),
                '&' => {
                    let end = self.property_end(self.pos + 1);
                    self.push(ANCHOR, end);
                }
                '*' => {
                    let end = self.property_end(self.pos + 1);
                    self.push(REFERENCE, end);
                }
                '!' => {
                    let end = self.property_end(self.pos + 1);
                    self.push(TAG, end);
                }
                '|' | '>' if self.flow_depth == 0 => self.block_scalar_header(),
                '\'' => self.single_quoted(),
                '"' => self.double_quoted(),
                _ => self.plain_scalar(),
            }
        }

        self.tokens
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input[self.pos + offset..].chars().next()
    }

    fn column(&self) -> usize {
        self.input[self.line_start..self.pos].chars().count()
    }

    fn push(&mut self, kind: SyntaxKind, end: usize) {
        let indicator = self.first_content_column.is_none()
            && matches!(kind, SyntaxKind::DASH | SyntaxKind::QUESTION | SyntaxKind::COLON);
        if !kind.is_trivia() && !indicator && self.first_content_column.is_none() {
            self.first_content_column = Some(self.column());
        }
        self.tokens.push((kind, &self.input[self.pos..end]));
        self.pos = end;
    }

    fn newline(&mut self, len: usize) {
        self.push(SyntaxKind::NEWLINE, self.pos + len);
        self.line_start = self.pos;
        self.last_indicator_column = None;
        self.first_content_column = None;
        if let Some(parent) = self.pending_block_scalar.take() {
            self.block_scalar_text(parent);
        }
    }

    fn whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        let mut end = self.pos;
        if self.pos == self.line_start {
            while end < bytes.len() && bytes[end] == b' ' {
                end += 1;
            }
            if end > self.pos {
                self.push(SyntaxKind::INDENT, end);
                return;
            }
        }
        while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
            end += 1;
        }
        self.push(SyntaxKind::WHITESPACE, end);
    }

    /// A '#' only starts a comment at the start of a line or after whitespace.
    fn at_token_boundary(&self) -> bool {
        self.input[..self.pos]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace())
    }

    /// A `-`, `?` or `:` followed by a blank, before any content on a block
    /// line, opens a sequence entry, an explicit key or an explicit value.
    fn at_block_indicator(&self) -> bool {
        self.flow_depth == 0 && self.first_content_column.is_none() && self.followed_by_blank(1)
    }

    fn followed_by_blank(&self, offset: usize) -> bool {
        self.peek_char(offset).map_or(true, |c| c.is_whitespace())
    }

    fn is_document_marker(&self, ch: char) -> bool {
        let marker = if ch == '-' { "---" } else { "..." };
        self.flow_depth == 0 && self.input[self.pos..].starts_with(marker) && self.followed_by_blank(3)
    }

    /// End of the current line, excluding the line break.
    fn line_end(&self, from: usize) -> usize {
        self.input[from..]
            .find(['\n', '\r'])
            .map_or(self.input.len(), |offset| from + offset)
    }

    fn property_end(&self, from: usize) -> usize {
        let mut end = from;
        for (offset, c) in self.input[from..].char_indices() {
            if c.is_whitespace() || (self.flow_depth > 0 && matches!(c, ',' | '[' | ']' | '{' | '}'))
            {
                break;
            }
            end = from + offset + c.len_utf8();
        }
        end
    }

    fn block_scalar_header(&mut self) {
        let mut end = self.pos + 1;
        for c in self.input[end..].chars() {
            if c.is_ascii_digit() || c == '+' || c == '-' {
                end += 1;
            } else {
                break;
            }
        }
        let parent = match (self.first_content_column, self.last_indicator_column) {
            (Some(column), _) | (None, Some(column)) => column as isize,
            (None, None) => -1,
        };
        self.pending_block_scalar = Some(parent);
        self.push(SyntaxKind::BLOCK_SCALAR_HEADER, end);
    }

    /// Consume the lines that belong to a block scalar: blank lines and lines
    /// indented deeper than the parent node. Trailing blank lines are left to
    /// the regular tokens.
    fn block_scalar_text(&mut self, parent: isize) {
        let mut cursor = self.pos;
        let mut content_end = None;
        while cursor < self.input.len() {
            let end = self.line_end(cursor);
            let line = &self.input[cursor..end];
            let indent = line.len() - line.trim_start_matches(' ').len();
            if !line.trim().is_empty() {
                if indent as isize > parent {
                    content_end = Some(end);
                } else {
                    break;
                }
            }
            cursor = match self.input[end..].chars().next() {
                Some('\r') if self.input[end + 1..].starts_with('\n') => end + 2,
                Some(_) => end + 1,
                None => break,
            };
        }
        if let Some(end) = content_end {
            self.push(SyntaxKind::BLOCK_SCALAR_TEXT, end);
        }
    }

    fn single_quoted(&mut self) {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                self.push(SyntaxKind::SINGLE_QUOTED, i + 1);
                return;
            }
            i += 1;
        }
        self.push(SyntaxKind::UNTERMINATED_STRING, self.input.len());
    }

    fn double_quoted(&mut self) {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.push(SyntaxKind::DOUBLE_QUOTED, i + 1);
                    return;
                }
                _ => i += 1,
            }
        }
        self.push(SyntaxKind::UNTERMINATED_STRING, self.input.len());
    }

    fn plain_scalar(&mut self) {
        let in_flow = self.flow_depth > 0;
        let mut end = self.pos;
        let mut previous = None;
        for (offset, c) in self.input[self.pos..].char_indices() {
            let at = self.pos + offset;
            if offset > 0 {
                match c {
                    '\n' | '\r' => break,
                    ':' => {
                        let next = self.input[at + 1..].chars().next();
                        if next.map_or(true, |n| n.is_whitespace())
                            || (in_flow && matches!(next, Some(',' | '[' | ']' | '{' | '}')))
                        {
                            break;
                        }
                    }
                    '#' if previous.map_or(false, |p: char| p.is_whitespace()) => break,
                    ',' | '[' | ']' | '{' | '}' if in_flow => break,
                    _ => {}
                }
            }
            if !c.is_whitespace() {
                end = at + c.len_utf8();
            }
            previous = Some(c);
        }
        let text = &self.input[self.pos..end];
        self.push(classify_scalar(text), end);
    }
}

/// Classify a plain scalar based on its content
fn classify_scalar(text: &str) -> SyntaxKind {
    use SyntaxKind::*;

    match text {
        "true" | "false" | "True" | "False" | "TRUE" | "FALSE" => return BOOL,
        "null" | "Null" | "NULL" | "~" => return NULL,
        ".inf" | "-.inf" | "+.inf" | ".Inf" | "-.Inf" | ".nan" | ".NaN" => return FLOAT,
        _ => {}
    }

    if text.parse::<i64>().is_ok() {
        return INT;
    }

    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if let Some(hex) = digits.strip_prefix("0x") {
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return INT;
        }
    }
    if let Some(octal) = digits.strip_prefix("0o") {
        if !octal.is_empty() && octal.chars().all(|c| c.is_digit(8)) {
            return INT;
        }
    }

    if text.chars().any(|c| c.is_ascii_digit()) && text.parse::<f64>().is_ok() {
        return FLOAT;
    }

    STRING
}
