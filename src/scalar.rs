//! Scalar value wrapper with proper escaping and style support.

use std::fmt;

/// Style of scalar representation in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Plain scalar (no quotes)
    Plain,
    /// Single-quoted scalar
    SingleQuoted,
    /// Double-quoted scalar
    DoubleQuoted,
    /// Literal scalar (|)
    Literal,
    /// Folded scalar (>)
    Folded,
}

/// Type of a scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// String value
    String,
    /// Integer value
    Integer,
    /// Float value
    Float,
    /// Boolean value
    Boolean,
    /// Null value
    Null,
}

/// A scalar value with metadata about its style and content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarValue {
    /// The actual value
    value: String,
    /// The style to use when rendering
    style: ScalarStyle,
    /// The type of the scalar
    scalar_type: ScalarType,
}

impl ScalarValue {
    /// Create a new string scalar with automatic style detection
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let style = Self::detect_style(&value);
        Self {
            value,
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a new string scalar with a specific style
    pub fn with_style(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a plain scalar whose text is already in YAML syntax for `scalar_type`,
    /// e.g. `"0x1F"` as an integer.
    pub fn typed(value: impl Into<String>, scalar_type: ScalarType) -> Self {
        let value = value.into();
        match scalar_type {
            ScalarType::String => Self::new(value),
            _ => Self {
                value,
                style: ScalarStyle::Plain,
                scalar_type,
            },
        }
    }

    /// Create a single-quoted scalar
    pub fn single_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::SingleQuoted)
    }

    /// Create a double-quoted scalar
    pub fn double_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::DoubleQuoted)
    }

    /// Create a literal scalar
    pub fn literal(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::Literal)
    }

    /// Create a null scalar
    pub fn null() -> Self {
        Self {
            value: "null".to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Null,
        }
    }

    /// Get the raw value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the style
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// Get the resolved type
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// Whether this scalar is null
    pub fn is_null(&self) -> bool {
        self.scalar_type == ScalarType::Null
    }

    /// Whether rendering this scalar needs a block scalar
    pub fn is_block(&self) -> bool {
        matches!(self.style, ScalarStyle::Literal | ScalarStyle::Folded)
    }

    /// Detect the appropriate style for a value
    fn detect_style(value: &str) -> ScalarStyle {
        if value.contains('\n') {
            // Block scalars cannot carry leading blanks on their first line,
            // carriage returns, or nothing but line breaks
            if value.starts_with([' ', '\t'])
                || value.contains('\r')
                || value.chars().all(|c| c == '\n')
            {
                ScalarStyle::DoubleQuoted
            } else {
                ScalarStyle::Literal
            }
        } else if Self::needs_quoting(value) {
            // Prefer single quotes unless the value has characters that
            // only double quotes can escape
            if value.chars().any(|c| c.is_control()) {
                ScalarStyle::DoubleQuoted
            } else {
                ScalarStyle::SingleQuoted
            }
        } else {
            ScalarStyle::Plain
        }
    }

    /// Check if a value needs quoting when treated as a string
    fn needs_quoting(value: &str) -> bool {
        if value.is_empty() {
            return true;
        }

        // YAML keywords that would be misinterpreted
        let lowercase = value.to_lowercase();
        if matches!(
            lowercase.as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "y" | "n" | "null" | "~"
        ) {
            return true;
        }

        // Things that look like numbers stay strings
        if value.parse::<f64>().is_ok() || value.parse::<i64>().is_ok() {
            return true;
        }
        let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
        if digits.starts_with("0x") || digits.starts_with("0o") {
            return true;
        }
        if matches!(lowercase.as_str(), ".inf" | "-.inf" | "+.inf" | ".nan") {
            return true;
        }

        // Indicators that change meaning at the start of a scalar
        if let Some(first) = value.chars().next() {
            if matches!(
                first,
                '-' | '?'
                    | ':'
                    | ','
                    | '['
                    | ']'
                    | '{'
                    | '}'
                    | '#'
                    | '&'
                    | '*'
                    | '!'
                    | '|'
                    | '>'
                    | '\''
                    | '"'
                    | '%'
                    | '@'
                    | '`'
            ) {
                return true;
            }
        }

        // Mapping and comment indicators inside the value
        if value.contains(": ") || value.ends_with(':') || value.contains(" #") {
            return true;
        }

        if value.chars().any(|c| c.is_control()) {
            return true;
        }

        // Leading/trailing whitespace needs quotes
        value != value.trim()
    }

    /// Render the scalar inline, as it would appear after `key: `.
    ///
    /// Literal and folded scalars are rendered as block scalars indented by
    /// two spaces; use [`ScalarValue::to_block_string`] to control the
    /// indentation.
    pub fn to_yaml_string(&self) -> String {
        match self.style {
            ScalarStyle::Plain => match self.scalar_type {
                ScalarType::String if Self::needs_quoting(&self.value) => {
                    if self.value.chars().any(|c| c.is_control()) {
                        self.to_double_quoted()
                    } else {
                        self.to_single_quoted()
                    }
                }
                _ => self.value.clone(),
            },
            ScalarStyle::SingleQuoted => self.to_single_quoted(),
            ScalarStyle::DoubleQuoted => self.to_double_quoted(),
            ScalarStyle::Literal | ScalarStyle::Folded => self.to_block_string(2),
        }
    }

    /// Convert to single-quoted string
    fn to_single_quoted(&self) -> String {
        // Escape single quotes by doubling them
        let escaped = self.value.replace('\'', "''");
        format!("'{}'", escaped)
    }

    /// Convert to double-quoted string
    fn to_double_quoted(&self) -> String {
        let mut result = String::from("\"");
        for ch in self.value.chars() {
            match ch {
                '"' => result.push_str("\\\""),
                '\\' => result.push_str("\\\\"),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\x08' => result.push_str("\\b"),
                '\x0C' => result.push_str("\\f"),
                c if c.is_control() => {
                    result.push_str(&format!("\\x{:02x}", c as u32));
                }
                c => result.push(c),
            }
        }
        result.push('"');
        result
    }

    /// Render as a block scalar whose content lines are indented by `indent`
    /// spaces. The chomping indicator keeps the trailing newlines intact.
    pub fn to_block_string(&self, indent: usize) -> String {
        let indicator = if self.style == ScalarStyle::Folded {
            '>'
        } else {
            '|'
        };
        let body = self.value.trim_end_matches('\n');
        let chomping = match self.value.len() - body.len() {
            0 => "-",
            1 => "",
            _ => "+",
        };

        let mut result = format!("{}{}", indicator, chomping);
        for line in body.split('\n') {
            result.push('\n');
            if !line.is_empty() {
                result.push_str(&" ".repeat(indent));
                result.push_str(line);
            }
        }
        // Kept trailing newlines must appear as blank lines
        if chomping == "+" {
            for _ in 1..self.value.len() - body.len() {
                result.push('\n');
            }
        }
        result
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yaml_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        Self::typed(value.to_string(), ScalarType::Integer)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::typed(value.to_string(), ScalarType::Integer)
    }
}

impl From<u16> for ScalarValue {
    fn from(value: u16) -> Self {
        Self::typed(value.to_string(), ScalarType::Integer)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        let text = if value.is_nan() {
            ".nan".to_string()
        } else if value.is_infinite() {
            if value > 0.0 { ".inf" } else { "-.inf" }.to_string()
        } else if value.fract() == 0.0 && value.abs() < 1e16 {
            format!("{:.1}", value)
        } else {
            value.to_string()
        };
        Self::typed(text, ScalarType::Float)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::typed(if value { "true" } else { "false" }, ScalarType::Boolean)
    }
}

/// Decode the text of a plain scalar, folding continuation lines.
pub(crate) fn decode_plain(text: &str) -> String {
    fold_lines(text.lines().map(str::trim))
}

/// Decode the text of a single-quoted scalar, including its quotes.
pub(crate) fn decode_single_quoted(text: &str) -> String {
    let inner = strip_quotes(text, '\'');
    let lines: Vec<&str> = inner.split('\n').collect();
    let last = lines.len() - 1;
    // Only blanks around a line break are folded away
    let folded = lines.iter().enumerate().map(|(index, line)| {
        let mut line = *line;
        if index > 0 {
            line = line.trim_start_matches([' ', '\t']);
        }
        if index < last {
            line = line.trim_end_matches([' ', '\t', '\r']);
        }
        line
    });
    fold_lines(folded).replace("''", "'")
}

/// Decode the text of a double-quoted scalar, including its quotes.
pub(crate) fn decode_double_quoted(text: &str) -> String {
    let inner = strip_quotes(text, '"');
    let mut result = String::new();
    let mut chars = inner.chars().peekable();
    let mut pending_break = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                pending_break = false;
                match chars.next() {
                    Some('n') => result.push('\n'),
                    Some('t') | Some('\t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some('b') => result.push('\x08'),
                    Some('f') => result.push('\x0C'),
                    Some('0') => result.push('\0'),
                    Some('e') => result.push('\x1b'),
                    Some(' ') => result.push(' '),
                    Some('/') => result.push('/'),
                    Some('"') => result.push('"'),
                    Some('\\') => result.push('\\'),
                    Some('N') => result.push('\u{85}'),
                    Some('_') => result.push('\u{a0}'),
                    Some(code @ ('x' | 'u' | 'U')) => {
                        let len = match code {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let hex: String = chars.by_ref().take(len).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(decoded) => result.push(decoded),
                            None => {
                                result.push('\\');
                                result.push(code);
                                result.push_str(&hex);
                            }
                        }
                    }
                    // Escaped line break: join without a space
                    Some('\n') => {
                        while chars.peek().map_or(false, |c| *c == ' ' || *c == '\t') {
                            chars.next();
                        }
                    }
                    Some(other) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => result.push('\\'),
                }
            }
            '\r' => {}
            '\n' => {
                let trimmed = result.trim_end_matches([' ', '\t']).len();
                result.truncate(trimmed);
                while chars.peek().map_or(false, |c| *c == ' ' || *c == '\t') {
                    chars.next();
                }
                if pending_break {
                    result.push('\n');
                } else {
                    result.push(' ');
                    pending_break = true;
                }
                continue;
            }
            c => result.push(c),
        }
        pending_break = false;
    }
    // Blank lines inside a quoted scalar replace the folded space
    result.replace(" \n", "\n")
}

/// Decode a block scalar from its header (e.g. `|-` or `>2`) and content
/// lines. `parent` is the indentation of the node that owns the scalar, which
/// an explicit indentation indicator counts from. `trailing_breaks` is the
/// number of blank lines after the content, kept only by `+` chomping.
pub(crate) fn decode_block(header: &str, body: &str, parent: isize, trailing_breaks: usize) -> String {
    let folded = header.starts_with('>');
    let chomping = if header.contains('-') {
        Chomping::Strip
    } else if header.contains('+') {
        Chomping::Keep
    } else {
        Chomping::Clip
    };

    let lines: Vec<&str> = body.lines().collect();
    let indent = match header.chars().find_map(|c| c.to_digit(10)) {
        Some(digit) => (parent + digit as isize).max(0) as usize,
        None => lines
            .iter()
            .find(|line| !line.trim().is_empty())
            .map_or(0, |line| line.len() - line.trim_start_matches(' ').len()),
    };
    let content: Vec<&str> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect();

    let mut text = if folded {
        let is_plain = |line: &str| !line.is_empty() && !line.starts_with([' ', '\t']);
        let mut result = String::new();
        let mut previous: Option<&str> = None;
        for line in content.iter().copied() {
            if let Some(prev) = previous {
                if line.is_empty() {
                    result.push('\n');
                } else if prev.is_empty() {
                    // Line breaks were already emitted for the blank lines
                } else if is_plain(prev) && is_plain(line) {
                    result.push(' ');
                } else {
                    result.push('\n');
                }
            }
            result.push_str(line);
            previous = Some(line);
        }
        result
    } else {
        content.join("\n")
    };

    match chomping {
        Chomping::Strip => {}
        Chomping::Clip => {
            if !text.is_empty() {
                text.push('\n');
            }
        }
        Chomping::Keep => {
            if !text.is_empty() {
                text.push('\n');
            }
            text.extend(std::iter::repeat('\n').take(trailing_breaks));
        }
    }
    text
}

#[derive(Clone, Copy)]
enum Chomping {
    Strip,
    Clip,
    Keep,
}

fn strip_quotes(text: &str, quote: char) -> &str {
    let text = text.strip_prefix(quote).unwrap_or(text);
    text.strip_suffix(quote).unwrap_or(text)
}

/// Join lines with spaces, turning each empty line into a line break.
fn fold_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut result = String::new();
    let mut first = true;
    let mut pending_breaks = 0;
    for line in lines {
        if first {
            result.push_str(line);
            first = false;
        } else if line.is_empty() {
            pending_breaks += 1;
        } else {
            if pending_breaks > 0 {
                result.push_str(&"\n".repeat(pending_breaks));
            } else {
                result.push(' ');
            }
            pending_breaks = 0;
            result.push_str(line);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scalars() {
        let scalar = ScalarValue::new("simple");
        assert_eq!(scalar.to_yaml_string(), "simple");

        let scalar = ScalarValue::new("hello world");
        assert_eq!(scalar.to_yaml_string(), "hello world");

        let scalar = ScalarValue::new("fiori-tools-appreload");
        assert_eq!(scalar.to_yaml_string(), "fiori-tools-appreload");

        let scalar = ScalarValue::new("http://localhost:8080/sap");
        assert_eq!(scalar.to_yaml_string(), "http://localhost:8080/sap");

        let scalar = ScalarValue::new("./webapp/localService/metadata.xml");
        assert_eq!(scalar.to_yaml_string(), "./webapp/localService/metadata.xml");
    }

    #[test]
    fn test_values_needing_quotes() {
        let cases = [
            ("true", "'true'"),
            ("no", "'no'"),
            ("null", "'null'"),
            ("~", "'~'"),
            ("123", "'123'"),
            ("3.14", "'3.14'"),
            ("0x10", "'0x10'"),
            ("value: something", "'value: something'"),
            ("trailing:", "'trailing:'"),
            ("# comment", "'# comment'"),
            ("a #b", "'a #b'"),
            ("@sap/ux-ui5-tooling", "'@sap/ux-ui5-tooling'"),
            ("  spaces  ", "'  spaces  '"),
            ("-item", "'-item'"),
            (".inf", "'.inf'"),
            ("[array]", "'[array]'"),
            ("", "''"),
        ];
        for (value, expected) in cases {
            assert_eq!(ScalarValue::new(value).to_yaml_string(), expected, "{}", value);
        }
    }

    #[test]
    fn test_single_quoted() {
        let scalar = ScalarValue::single_quoted("value with 'quotes'");
        assert_eq!(scalar.to_yaml_string(), "'value with ''quotes'''");
    }

    #[test]
    fn test_double_quoted() {
        let scalar = ScalarValue::double_quoted("value with \"quotes\" and \\backslash");
        assert_eq!(
            scalar.to_yaml_string(),
            "\"value with \\\"quotes\\\" and \\\\backslash\""
        );

        let scalar = ScalarValue::new("tab\there");
        assert_eq!(scalar.to_yaml_string(), "\"tab\\there\"");
    }

    #[test]
    fn test_multiline() {
        let scalar = ScalarValue::new("line1\nline2\n");
        assert_eq!(scalar.style(), ScalarStyle::Literal);
        assert_eq!(scalar.to_block_string(4), "|\n    line1\n    line2");

        let scalar = ScalarValue::new("a\n\nb");
        assert_eq!(scalar.to_block_string(2), "|-\n  a\n\n  b");

        let scalar = ScalarValue::new("  indented\nsecond");
        assert_eq!(scalar.style(), ScalarStyle::DoubleQuoted);

        let scalar = ScalarValue::new("\n");
        assert_eq!(scalar.style(), ScalarStyle::DoubleQuoted);
        assert_eq!(scalar.to_yaml_string(), "\"\\n\"");
    }

    #[test]
    fn test_from_types() {
        assert_eq!(ScalarValue::from(42).to_yaml_string(), "42");
        assert_eq!(ScalarValue::from(3.5).to_yaml_string(), "3.5");
        assert_eq!(ScalarValue::from(2.0).to_yaml_string(), "2.0");
        assert_eq!(ScalarValue::from(true).to_yaml_string(), "true");
        assert_eq!(ScalarValue::from(35729u16).scalar_type(), ScalarType::Integer);
    }

    #[test]
    fn test_null_scalar() {
        let scalar = ScalarValue::null();
        assert_eq!(scalar.to_yaml_string(), "null");
        assert!(scalar.is_null());
    }

    #[test]
    fn test_decode_plain() {
        assert_eq!(decode_plain("word"), "word");
        assert_eq!(decode_plain("first\n  second"), "first second");
        assert_eq!(decode_plain("first\n\n  second"), "first\nsecond");
    }

    #[test]
    fn test_decode_quoted() {
        assert_eq!(decode_single_quoted("'it''s'"), "it's");
        assert_eq!(decode_single_quoted("' lead'"), " lead");
        assert_eq!(decode_single_quoted("'trail '"), "trail ");
        assert_eq!(decode_single_quoted("' '"), " ");
        assert_eq!(decode_single_quoted("''"), "");
        assert_eq!(decode_single_quoted("' one  \n   two '"), " one two ");
        assert_eq!(decode_single_quoted("'one\r\n\r\n  two'"), "one\ntwo");
        assert_eq!(decode_double_quoted(r#""a\tb\n""#), "a\tb\n");
        assert_eq!(decode_double_quoted(r#""é\x41""#), "éA");
        assert_eq!(decode_double_quoted("\"one\n  two\""), "one two");
        assert_eq!(decode_double_quoted("\"one\n\n  two\""), "one\ntwo");
    }

    #[test]
    fn test_decode_block() {
        assert_eq!(decode_block("|", "  a\n  b", 0, 0), "a\nb\n");
        assert_eq!(decode_block("|-", "    a\n      b", 0, 0), "a\n  b");
        assert_eq!(decode_block(">", "  a\n  b\n\n  c", 0, 0), "a b\nc\n");
    }

    #[test]
    fn test_decode_block_indentation_indicator() {
        assert_eq!(decode_block("|2", "    indented", 0, 0), "  indented\n");
        assert_eq!(decode_block("|1-", "     x\n    y", 2, 0), "  x\n y");
        assert_eq!(decode_block(">2", "    lead\n  text", 0, 0), "  lead\ntext\n");
    }

    #[test]
    fn test_decode_block_keep_chomping() {
        assert_eq!(decode_block("|+", "  x", 0, 2), "x\n\n\n");
        assert_eq!(decode_block("|+", "", 0, 1), "\n");
        assert_eq!(decode_block("|", "  x", 0, 2), "x\n");
        assert_eq!(decode_block("|-", "  x", 0, 2), "x");
    }
}
