//! Lossless YAML syntax tree and typed views over it.

use crate::{
    error::{YamlError, YamlResult},
    lex::SyntaxKind,
    mutation::{self, NodeComment},
    parse::Parse,
    path::YamlPath,
    scalar::{self, ScalarStyle, ScalarType, ScalarValue},
    value::YamlValue,
    Indentation,
};
use indexmap::IndexMap;
use rowan::ast::AstNode;
use std::path::Path;
use std::str::FromStr;

/// YAML language type for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl rowan::Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::COMMENT as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub(crate) type SyntaxNode = rowan::SyntaxNode<Lang>;
pub(crate) type SyntaxToken = rowan::SyntaxToken<Lang>;
pub(crate) type SyntaxElement = rowan::SyntaxElement<Lang>;

/// A macro to create AST node wrappers.
macro_rules! ast_node {
    ($ast:ident, $kind:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $ast(SyntaxNode);

        impl std::fmt::Debug for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ast))
                    .field("syntax", &self.0)
                    .finish()
            }
        }

        impl AstNode for $ast {
            type Language = Lang;

            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                if Self::can_cast(syntax.kind()) {
                    Some(Self(syntax))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }

        impl From<SyntaxNode> for $ast {
            fn from(node: SyntaxNode) -> Self {
                $ast(node)
            }
        }

        impl std::fmt::Display for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.text())
            }
        }
    };
}

ast_node!(
    Yaml,
    ROOT,
    "A YAML file containing zero or more documents"
);
ast_node!(Document, DOCUMENT, "A single YAML document");
ast_node!(Sequence, SEQUENCE, "A YAML sequence (list)");
ast_node!(Mapping, MAPPING, "A YAML mapping (key-value pairs)");
ast_node!(MappingEntry, MAPPING_ENTRY, "A key-value pair in a YAML mapping");
ast_node!(SequenceEntry, SEQUENCE_ENTRY, "An entry in a YAML sequence");
ast_node!(Scalar, SCALAR, "A YAML scalar value");

/// The first content node (mapping, sequence or scalar) among the children of `node`.
fn content_child(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|child| {
        matches!(
            child.kind(),
            SyntaxKind::MAPPING | SyntaxKind::SEQUENCE | SyntaxKind::SCALAR
        )
    })
}

/// Column of the first character of `node`.
pub(crate) fn column_of(node: &SyntaxNode) -> usize {
    let mut column = 0;
    let mut token = node.first_token().and_then(|token| token.prev_token());
    while let Some(current) = token {
        let text = current.text();
        if let Some(pos) = text.rfind(['\n', '\r']) {
            column += text[pos + 1..].chars().count();
            break;
        }
        column += text.chars().count();
        token = current.prev_token();
    }
    column
}

/// Whether a collection node is written in flow style.
pub(crate) fn is_flow_node(node: &SyntaxNode) -> bool {
    node.first_token().map_or(false, |token| {
        matches!(
            token.kind(),
            SyntaxKind::LEFT_BRACKET | SyntaxKind::LEFT_BRACE
        )
    })
}

impl Default for Yaml {
    fn default() -> Self {
        Self::new()
    }
}

impl Yaml {
    /// Create an empty YAML file.
    pub fn new() -> Self {
        let mut builder = rowan::GreenNodeBuilder::new();
        builder.start_node(SyntaxKind::ROOT.into());
        builder.finish_node();
        Yaml(SyntaxNode::new_root_mut(builder.finish()))
    }

    /// Parse YAML text, keeping any errors alongside a best-effort tree.
    pub fn parse(text: &str) -> Parse<Yaml> {
        Parse::parse_yaml(text)
    }

    /// Read and parse a YAML file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> YamlResult<Yaml> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => YamlError::FileNotFound(path.to_path_buf()),
            _ => YamlError::Io(err),
        })?;
        text.parse()
    }

    /// All documents in the file.
    pub fn documents(&self) -> impl Iterator<Item = Document> {
        self.0.children().filter_map(Document::cast)
    }

    /// The first document, if the file has one.
    pub fn document(&self) -> Option<Document> {
        self.documents().next()
    }

    /// Look up a node in the first document; see [`Document::get`].
    pub fn get(&self, path: &str) -> Option<YamlNode> {
        self.document()?.get(path)
    }

    /// Append `value` at `path` in the first document, creating the document
    /// and any missing keys. Uses the default indentation.
    pub fn append_to(
        &mut self,
        path: &str,
        value: &YamlValue,
        comments: &[NodeComment],
    ) -> YamlResult<()> {
        self.append_to_with(path, value, comments, Indentation::default())
    }

    /// Like [`Yaml::append_to`] with an explicit indentation for new lines.
    pub fn append_to_with(
        &mut self,
        path: &str,
        value: &YamlValue,
        comments: &[NodeComment],
        indentation: Indentation,
    ) -> YamlResult<()> {
        mutation::append_to(&self.0, path, value, comments, indentation)
    }

    /// An independent copy of this tree; edits to one do not affect the other.
    pub(crate) fn snapshot(&self) -> Yaml {
        Yaml(SyntaxNode::new_root_mut(self.0.green().into_owned()))
    }

    /// The indentation step used by the first nested block collection, if any.
    pub fn detect_indentation(&self) -> Option<usize> {
        mutation::detect_indentation(&self.0)
    }
}

impl FromStr for Yaml {
    type Err = YamlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Yaml::parse(s).to_result()?)
    }
}

impl Document {
    /// The top-level node of this document.
    pub fn root_node(&self) -> Option<YamlNode> {
        content_child(&self.0).and_then(YamlNode::cast)
    }

    /// The top-level node, if it is a mapping.
    pub fn as_mapping(&self) -> Option<Mapping> {
        self.root_node()?.as_mapping().cloned()
    }

    /// The top-level node, if it is a sequence.
    pub fn as_sequence(&self) -> Option<Sequence> {
        self.root_node()?.as_sequence().cloned()
    }

    /// The top-level node, if it is a scalar.
    pub fn as_scalar(&self) -> Option<Scalar> {
        self.root_node()?.as_scalar().cloned()
    }

    /// Resolve a dotted path such as `server.customMiddleware[0].name`.
    /// Returns `None` when the path is malformed or leads nowhere.
    pub fn get(&self, path: &str) -> Option<YamlNode> {
        let path = YamlPath::parse(path).ok()?;
        self.get_path(&path)
    }

    /// Resolve a parsed path.
    pub fn get_path(&self, path: &YamlPath) -> Option<YamlNode> {
        self.root_node()?.get_path(path)
    }

    /// Append `value` at `path` in this document; see [`Yaml::append_to`].
    pub fn append_to(
        &mut self,
        path: &str,
        value: &YamlValue,
        comments: &[NodeComment],
    ) -> YamlResult<()> {
        mutation::append_to(&self.0, path, value, comments, Indentation::default())
    }

    /// The owned value of the document root. An empty document is null.
    pub fn to_value(&self) -> YamlValue {
        self.root_node()
            .map_or_else(YamlValue::null, |node| node.to_value())
    }
}

/// A content node: mapping, sequence or scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum YamlNode {
    /// A block or flow mapping
    Mapping(Mapping),
    /// A block or flow sequence
    Sequence(Sequence),
    /// A scalar, including aliases
    Scalar(Scalar),
}

impl YamlNode {
    /// Wrap a syntax node of a content kind.
    pub(crate) fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::MAPPING => Some(YamlNode::Mapping(Mapping(node))),
            SyntaxKind::SEQUENCE => Some(YamlNode::Sequence(Sequence(node))),
            SyntaxKind::SCALAR => Some(YamlNode::Scalar(Scalar(node))),
            _ => None,
        }
    }

    pub(crate) fn syntax(&self) -> &SyntaxNode {
        match self {
            YamlNode::Mapping(mapping) => mapping.syntax(),
            YamlNode::Sequence(sequence) => sequence.syntax(),
            YamlNode::Scalar(scalar) => scalar.syntax(),
        }
    }

    /// The node as a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            YamlNode::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// The node as a sequence.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            YamlNode::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// The node as a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            YamlNode::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Whether the node is a flow collection (`[...]` or `{...}`).
    pub fn is_flow(&self) -> bool {
        is_flow_node(self.syntax())
    }

    /// Resolve `path` relative to this node.
    pub fn get_path(&self, path: &YamlPath) -> Option<YamlNode> {
        let mut current = self.clone();
        for segment in path.segments() {
            current = match &current {
                YamlNode::Mapping(mapping) => mapping.get(&segment.as_key())?,
                YamlNode::Sequence(sequence) => sequence.get(segment.as_index()?)?,
                YamlNode::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    /// Convert this subtree into an owned value.
    pub fn to_value(&self) -> YamlValue {
        match self {
            YamlNode::Mapping(mapping) => mapping.to_value(),
            YamlNode::Sequence(sequence) => sequence.to_value(),
            YamlNode::Scalar(scalar) => YamlValue::Scalar(scalar.to_scalar_value()),
        }
    }
}

impl std::fmt::Display for YamlNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.syntax().text())
    }
}

impl Mapping {
    /// The entries of this mapping, in order.
    pub fn entries(&self) -> impl Iterator<Item = MappingEntry> {
        self.0.children().filter_map(MappingEntry::cast)
    }

    /// The entry whose decoded key equals `key`.
    pub fn find_entry(&self, key: &str) -> Option<MappingEntry> {
        self.entries()
            .find(|entry| entry.key_text().as_deref() == Some(key))
    }

    /// The value stored under `key`. Entries with an empty value yield `None`.
    pub fn get(&self, key: &str) -> Option<YamlNode> {
        self.find_entry(key)?.value()
    }

    /// Whether the mapping has an entry for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find_entry(key).is_some()
    }

    /// The decoded keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = String> {
        self.entries().filter_map(|entry| entry.key_text())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Whether the mapping is written as `{...}`.
    pub fn is_flow(&self) -> bool {
        is_flow_node(&self.0)
    }

    /// Convert into an owned mapping. Empty values become null.
    pub fn to_value(&self) -> YamlValue {
        let mut map = IndexMap::new();
        for entry in self.entries() {
            if let Some(key) = entry.key_text() {
                let value = entry
                    .value()
                    .map_or_else(YamlValue::null, |node| node.to_value());
                map.insert(key, value);
            }
        }
        YamlValue::Mapping(map)
    }
}

impl MappingEntry {
    /// The key scalar. Explicit (`? key`) and collection keys have none;
    /// such entries are kept as written but cannot be looked up.
    pub fn key(&self) -> Option<Scalar> {
        if self.is_explicit_key() {
            return None;
        }
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::KEY)
            .and_then(|key| key.children().find_map(Scalar::cast))
    }

    /// Whether the key is written with the `?` indicator.
    pub fn is_explicit_key(&self) -> bool {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::KEY)
            .and_then(|key| key.first_token())
            .map_or(false, |token| token.kind() == SyntaxKind::QUESTION)
    }

    /// The decoded key.
    pub fn key_text(&self) -> Option<String> {
        self.key().map(|key| key.as_string())
    }

    /// The key exactly as written, quotes included.
    pub fn raw_key(&self) -> Option<String> {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::KEY)
            .map(|key| key.text().to_string())
    }

    pub(crate) fn value_node(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|child| child.kind() == SyntaxKind::VALUE)
    }

    /// The value, or `None` if the entry has no value (`key:`).
    pub fn value(&self) -> Option<YamlNode> {
        self.value_node()
            .as_ref()
            .and_then(content_child)
            .and_then(YamlNode::cast)
    }

    /// The comment at the end of the key line, `#` included.
    pub fn trailing_comment(&self) -> Option<String> {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == SyntaxKind::COMMENT)
            .map(|token| token.text().to_string())
    }
}

impl Sequence {
    /// The entries of this sequence, in order.
    pub fn entries(&self) -> impl Iterator<Item = SequenceEntry> {
        self.0.children().filter_map(SequenceEntry::cast)
    }

    /// The item values. Entries without a value are skipped.
    pub fn items(&self) -> impl Iterator<Item = YamlNode> {
        self.entries().filter_map(|entry| entry.value())
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<YamlNode> {
        self.entries().nth(index)?.value()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the sequence has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Whether the sequence is written as `[...]`.
    pub fn is_flow(&self) -> bool {
        is_flow_node(&self.0)
    }

    /// Convert into an owned sequence. Empty entries become null.
    pub fn to_value(&self) -> YamlValue {
        YamlValue::Sequence(
            self.entries()
                .map(|entry| {
                    entry
                        .value()
                        .map_or_else(YamlValue::null, |node| node.to_value())
                })
                .collect(),
        )
    }
}

impl SequenceEntry {
    /// The value of this entry, or `None` for a bare `-`.
    pub fn value(&self) -> Option<YamlNode> {
        content_child(&self.0).and_then(YamlNode::cast)
    }
}

impl Scalar {
    /// The scalar exactly as written.
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }

    fn first_token(&self) -> Option<SyntaxToken> {
        self.0.first_token()
    }

    /// The scalar's content with quoting, escapes and line folding resolved.
    pub fn as_string(&self) -> String {
        let text = self.text();
        match self.first_token().map(|token| token.kind()) {
            Some(SyntaxKind::SINGLE_QUOTED) => scalar::decode_single_quoted(&text),
            Some(SyntaxKind::DOUBLE_QUOTED) => scalar::decode_double_quoted(&text),
            Some(SyntaxKind::BLOCK_SCALAR_HEADER) => {
                let header = self
                    .first_token()
                    .map(|token| token.text().to_string())
                    .unwrap_or_default();
                let body = self
                    .0
                    .children_with_tokens()
                    .filter_map(|element| element.into_token())
                    .find(|token| token.kind() == SyntaxKind::BLOCK_SCALAR_TEXT)
                    .map(|token| token.text().to_string())
                    .unwrap_or_default();
                scalar::decode_block(&header, &body, self.block_parent_column(), self.trailing_blank_lines())
            }
            Some(SyntaxKind::REFERENCE | SyntaxKind::UNTERMINATED_STRING) => text,
            _ => scalar::decode_plain(&text),
        }
    }

    /// Whether the scalar is single- or double-quoted.
    pub fn is_quoted(&self) -> bool {
        matches!(
            self.first_token().map(|token| token.kind()),
            Some(SyntaxKind::SINGLE_QUOTED | SyntaxKind::DOUBLE_QUOTED)
        )
    }

    /// Whether the scalar is a block scalar (`|` or `>`).
    pub fn is_block(&self) -> bool {
        self.first_token()
            .map_or(false, |token| token.kind() == SyntaxKind::BLOCK_SCALAR_HEADER)
    }

    /// Whether the scalar is an alias (`*name`).
    pub fn is_alias(&self) -> bool {
        self.first_token()
            .map_or(false, |token| token.kind() == SyntaxKind::REFERENCE)
    }

    /// Whether the scalar is a plain null (`~`, `null`).
    pub fn is_null(&self) -> bool {
        self.scalar_type() == ScalarType::Null
    }

    /// The tag written before the scalar, such as `!!str`.
    pub fn tag(&self) -> Option<String> {
        for element in self.0.siblings_with_tokens(rowan::Direction::Prev).skip(1) {
            match element.kind() {
                SyntaxKind::TAG => return element.into_token().map(|token| token.text().to_string()),
                SyntaxKind::WHITESPACE
                | SyntaxKind::NEWLINE
                | SyntaxKind::INDENT
                | SyntaxKind::COMMENT
                | SyntaxKind::ANCHOR => {}
                _ => return None,
            }
        }
        None
    }

    /// The resolved type. A core schema tag like `!!str` or `!!int` wins;
    /// otherwise quoted, block and multi-line scalars are strings.
    pub fn scalar_type(&self) -> ScalarType {
        if let Some(tagged) = self.tag().as_deref().and_then(tag_type) {
            return tagged;
        }
        let multi_line = self
            .0
            .children_with_tokens()
            .any(|element| element.kind() == SyntaxKind::NEWLINE);
        if multi_line {
            return ScalarType::String;
        }
        match self.first_token().map(|token| token.kind()) {
            Some(SyntaxKind::INT) => ScalarType::Integer,
            Some(SyntaxKind::FLOAT) => ScalarType::Float,
            Some(SyntaxKind::BOOL) => ScalarType::Boolean,
            Some(SyntaxKind::NULL) => ScalarType::Null,
            _ => ScalarType::String,
        }
    }

    /// Convert into an owned scalar, keeping the resolved type. Aliases are
    /// not resolved and come back as their `*name` text.
    pub fn to_scalar_value(&self) -> ScalarValue {
        if self.is_block() {
            let folded = self
                .first_token()
                .map_or(false, |token| token.text().starts_with('>'));
            let style = if folded {
                ScalarStyle::Folded
            } else {
                ScalarStyle::Literal
            };
            return ScalarValue::with_style(self.as_string(), style);
        }
        ScalarValue::typed(self.as_string(), self.scalar_type())
    }

    /// Indentation of the entry that owns a block scalar, `-1` at the
    /// document root.
    fn block_parent_column(&self) -> isize {
        self.0
            .ancestors()
            .find(|node| {
                matches!(
                    node.kind(),
                    SyntaxKind::MAPPING_ENTRY | SyntaxKind::SEQUENCE_ENTRY | SyntaxKind::DOCUMENT
                )
            })
            .filter(|node| node.kind() != SyntaxKind::DOCUMENT)
            .map_or(-1, |node| column_of(&node) as isize)
    }

    /// Blank lines between the end of a block scalar and the next content.
    fn trailing_blank_lines(&self) -> usize {
        let mut token = self.0.last_token().and_then(|token| token.next_token());
        // Finish the scalar's own last line first
        while let Some(current) = token {
            match current.kind() {
                SyntaxKind::NEWLINE => {
                    token = current.next_token();
                    break;
                }
                SyntaxKind::WHITESPACE | SyntaxKind::COMMENT => token = current.next_token(),
                _ => return 0,
            }
        }
        let mut count = 0;
        while let Some(current) = token {
            match current.kind() {
                SyntaxKind::NEWLINE => count += 1,
                SyntaxKind::WHITESPACE | SyntaxKind::INDENT => {}
                _ => break,
            }
            token = current.next_token();
        }
        count
    }
}

/// The type a core schema tag forces on a scalar. `!` alone marks a string.
fn tag_type(tag: &str) -> Option<ScalarType> {
    if tag == "!" {
        return Some(ScalarType::String);
    }
    let name = tag.strip_prefix("!!").or_else(|| {
        tag.strip_prefix("!<tag:yaml.org,2002:")
            .and_then(|rest| rest.strip_suffix('>'))
    })?;
    match name {
        "str" => Some(ScalarType::String),
        "int" => Some(ScalarType::Integer),
        "float" => Some(ScalarType::Float),
        "bool" => Some(ScalarType::Boolean),
        "null" => Some(ScalarType::Null),
        _ => None,
    }
}
