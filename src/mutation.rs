//! Appending values to a document in place.
//!
//! New content is rendered as block YAML at the column where it will live,
//! parsed on its own, and the resulting nodes are spliced into the existing
//! tree. Text outside the insertion point is never touched.

use crate::builder::{key_text, BlockBuilder};
use crate::error::{YamlError, YamlResult};
use crate::lex::SyntaxKind;
use crate::parse::parse;
use crate::path::{PathSegment, YamlPath};
use crate::value::YamlValue;
use crate::yaml::{column_of, Document, Mapping, MappingEntry, Sequence, SyntaxElement, SyntaxNode, YamlNode};
use crate::{Indentation, ParseError};
use indexmap::IndexMap;
use rowan::ast::AstNode;
use rowan::NodeOrToken;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A comment to write above one node of an appended value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeComment {
    /// Path of the node inside the appended value, e.g. `configuration.port`.
    /// The empty path is the appended value itself.
    pub path: String,
    /// Comment text without the leading `#`. Multi-line text becomes one
    /// comment line per line.
    pub comment: String,
}

impl NodeComment {
    /// Create a comment for the node at `path`.
    pub fn new(path: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            comment: comment.into(),
        }
    }
}

const PLACEHOLDER_KEY: &str = "__placeholder__";

/// A planned change: replace `range` of the children of `parent` with `elements`.
struct Splice {
    parent: SyntaxNode,
    range: Range<usize>,
    elements: Vec<SyntaxElement>,
    action: &'static str,
}

impl Splice {
    fn apply(self) {
        self.parent.splice_children(self.range, self.elements);
    }
}

/// Append `value` at `path` below `target`, which is either a whole file or
/// a single document.
pub(crate) fn append_to(
    target: &SyntaxNode,
    path: &str,
    value: &YamlValue,
    comments: &[NodeComment],
    indentation: Indentation,
) -> YamlResult<()> {
    let path = YamlPath::parse(path)?;
    let requested = comments;
    let comments = requested
        .iter()
        .map(|comment| Ok((YamlPath::parse(&comment.path)?, comment.comment.clone())))
        .collect::<YamlResult<Vec<_>>>()?;

    let step = match indentation {
        Indentation::Spaces(spaces) => spaces as usize,
        Indentation::Detect => detect_indentation(target).unwrap_or(2),
    };
    let newline = if target.text().to_string().contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    };
    let editor = Editor {
        path: &path,
        comments,
        requested,
        step,
        newline,
    };

    let document = if target.kind() == SyntaxKind::DOCUMENT {
        Document::cast(target.clone())
    } else {
        target.children().find_map(Document::cast)
    };
    let splice = match document {
        None => editor.new_document(target, value)?,
        Some(document) => match document.root_node() {
            None => editor.fill_document(&document, value)?,
            Some(root) => editor.plan(root, value)?,
        },
    };

    tracing::debug!(path = %path, action = splice.action, "appending value");
    splice.apply();
    Ok(())
}

/// The indentation step of the first block collection nested under a key.
pub(crate) fn detect_indentation(node: &SyntaxNode) -> Option<usize> {
    node.descendants()
        .filter_map(MappingEntry::cast)
        .find_map(|entry| {
            let value = entry.value()?;
            if value.as_scalar().is_some() || value.is_flow() {
                return None;
            }
            let parent = column_of(entry.syntax());
            let child = column_of(value.syntax());
            (child > parent).then(|| child - parent)
        })
}

/// Wrap `value` in one block mapping per key, ending in a sequence holding it.
fn nest(keys: &[String], value: &YamlValue) -> YamlValue {
    match keys.split_first() {
        None => YamlValue::Sequence(vec![value.clone()]),
        Some((key, rest)) => {
            let mut map = IndexMap::new();
            map.insert(key.clone(), nest(rest, value));
            YamlValue::Mapping(map)
        }
    }
}

fn is_empty_value(node: &YamlNode) -> bool {
    match node {
        YamlNode::Scalar(scalar) => scalar.is_null(),
        YamlNode::Mapping(mapping) => mapping.is_empty(),
        YamlNode::Sequence(sequence) => sequence.is_empty(),
    }
}

fn detach(elements: Vec<SyntaxElement>) -> Vec<SyntaxElement> {
    for element in &elements {
        match element {
            NodeOrToken::Node(node) => node.detach(),
            NodeOrToken::Token(token) => token.detach(),
        }
    }
    elements
}

fn unexpected_fragment() -> YamlError {
    YamlError::Parse(ParseError(vec![
        "rendered fragment has an unexpected structure".to_string(),
    ]))
}

struct Editor<'a> {
    path: &'a YamlPath,
    /// Comment paths relative to the appended value
    comments: Vec<(YamlPath, String)>,
    /// The comments as the caller wrote them, in the same order
    requested: &'a [NodeComment],
    step: usize,
    newline: &'static str,
}

impl Editor<'_> {
    fn error(&self, reason: impl Into<String>) -> YamlError {
        YamlError::path_resolution(self.path.to_string(), reason)
    }

    /// Walk the path down from the document root and plan the edit at its end.
    fn plan(&self, root: YamlNode, value: &YamlValue) -> YamlResult<Splice> {
        let segments = self.path.segments();
        let mut current = root;

        for (depth, segment) in segments.iter().enumerate() {
            current = match current {
                YamlNode::Mapping(mapping) => match mapping.find_entry(&segment.as_key()) {
                    None => return self.add_entry(&mapping, depth, value),
                    Some(entry) => match entry.value() {
                        Some(node) if !is_empty_value(&node) => node,
                        _ => return self.rebuild_entry(&mapping, &entry, depth, value),
                    },
                },
                YamlNode::Sequence(sequence) => {
                    let index = segment.as_index().ok_or_else(|| {
                        self.error(format!("'{}' is not a sequence index", segment.as_key()))
                    })?;
                    let entry = sequence.entries().nth(index).ok_or_else(|| {
                        self.error(format!(
                            "index {} is out of range for a sequence of {} entries",
                            index,
                            sequence.len()
                        ))
                    })?;
                    entry
                        .value()
                        .ok_or_else(|| self.error(format!("sequence entry {} is empty", index)))?
                }
                YamlNode::Scalar(_) => {
                    let prefix = YamlPath::from(segments[..depth].to_vec());
                    return Err(self.error(format!("'{}' is a scalar", prefix)));
                }
            };
        }

        match current {
            YamlNode::Sequence(sequence) if sequence.is_flow() => {
                self.append_flow_item(&sequence, value)
            }
            YamlNode::Sequence(sequence) => self.append_item(&sequence, value),
            YamlNode::Mapping(mapping) if mapping.is_flow() => {
                Err(self.error("cannot append to a flow mapping"))
            }
            YamlNode::Mapping(mapping) => self.merge_entries(&mapping, value),
            YamlNode::Scalar(_) => Err(self.error("the target is a scalar")),
        }
    }

    /// The path segments from `depth` on, all of which must be keys.
    fn keys_from(&self, depth: usize) -> YamlResult<Vec<String>> {
        self.path.segments()[depth.min(self.path.segments().len())..]
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => Ok(key.clone()),
                PathSegment::Index(index) => {
                    Err(self.error(format!("cannot create sequence index {}", index)))
                }
            })
            .collect()
    }

    /// Render with comment paths moved under `prefix`.
    fn render(
        &self,
        prefix: &YamlPath,
        write: impl FnOnce(&mut BlockBuilder<'_>),
    ) -> YamlResult<String> {
        let comments: Vec<(YamlPath, String)> = self
            .comments
            .iter()
            .map(|(path, text)| (prefix.concat(path), text.clone()))
            .collect();
        let mut builder = BlockBuilder::new(self.step, &comments);
        write(&mut builder);
        builder.finish().map_err(|index| {
            YamlError::path_resolution(
                self.requested[index].path.clone(),
                "no node at this path in the appended value",
            )
        })
    }

    /// Render the entries that create `keys` and hold `value` in a new sequence.
    fn render_nested(&self, keys: &[String], value: &YamlValue, column: usize) -> YamlResult<String> {
        let prefix = keys
            .iter()
            .fold(YamlPath::root(), |path, key| path.join(key.as_str()))
            .join(0);
        let nested = nest(keys, value);
        self.render(&prefix, |builder| match &nested {
            YamlValue::Mapping(map) => builder.mapping_entries(map, column, &YamlPath::root()),
            YamlValue::Sequence(items) => builder.sequence_items(items, column, &YamlPath::root()),
            YamlValue::Scalar(_) => {}
        })
    }

    fn parse_fragment(&self, text: &str) -> YamlResult<SyntaxNode> {
        let text = if self.newline == "\n" {
            text.to_string()
        } else {
            text.replace('\n', self.newline)
        };
        let parsed = parse(&text);
        if !parsed.errors.is_empty() {
            return Err(YamlError::Parse(ParseError(parsed.errors)));
        }
        Ok(SyntaxNode::new_root_mut(parsed.green_node))
    }

    /// Prefix for a fragment so it starts on a fresh line after `preceding`.
    fn line_break_after(&self, preceding: &str) -> &'static str {
        if preceding.is_empty() || preceding.ends_with(['\n', '\r']) {
            ""
        } else {
            "\n"
        }
    }

    /// The file has no document yet: add one.
    fn new_document(&self, root: &SyntaxNode, value: &YamlValue) -> YamlResult<Splice> {
        let keys = self.keys_from(0)?;
        let text = self.render_nested(&keys, value, 0)?;
        let existing = root.text().to_string();
        let fragment = self.parse_fragment(&format!("{}{}", self.line_break_after(&existing), text))?;

        let end = root.children_with_tokens().count();
        Ok(Splice {
            parent: root.clone(),
            range: end..end,
            elements: detach(fragment.children_with_tokens().collect()),
            action: "create document",
        })
    }

    /// The document exists but has no content, as in `---` alone.
    fn fill_document(&self, document: &Document, value: &YamlValue) -> YamlResult<Splice> {
        let keys = self.keys_from(0)?;
        let text = self.render_nested(&keys, value, 0)?;

        let syntax = document.syntax();
        let index = syntax
            .children_with_tokens()
            .position(|element| element.kind() == SyntaxKind::DOC_END)
            .unwrap_or_else(|| syntax.children_with_tokens().count());
        let preceding: String = syntax
            .children_with_tokens()
            .take(index)
            .map(|element| element.to_string())
            .collect();
        let fragment = self.parse_fragment(&format!("{}{}", self.line_break_after(&preceding), text))?;

        let mut elements = Vec::new();
        for element in fragment.children_with_tokens() {
            match element {
                NodeOrToken::Node(node) if node.kind() == SyntaxKind::DOCUMENT => {
                    elements.extend(node.children_with_tokens());
                }
                other => elements.push(other),
            }
        }
        Ok(Splice {
            parent: syntax.clone(),
            range: index..index,
            elements: detach(elements),
            action: "fill empty document",
        })
    }

    /// Parse `text`, whose first entry is a placeholder, and plan inserting
    /// everything after that placeholder behind the last entry of `collection`.
    fn splice_after_last_entry(
        &self,
        collection: &SyntaxNode,
        entry_kind: SyntaxKind,
        text: &str,
        action: &'static str,
    ) -> YamlResult<Splice> {
        let fragment = self.parse_fragment(text)?;
        let fragment_collection = fragment
            .descendants()
            .find(|node| node.kind() == collection.kind())
            .ok_or_else(unexpected_fragment)?;
        let elements: Vec<SyntaxElement> = fragment_collection
            .children_with_tokens()
            .skip_while(|element| element.kind() != entry_kind)
            .skip(1)
            .collect();

        let index = collection
            .children()
            .filter(|child| child.kind() == entry_kind)
            .last()
            .map_or(0, |last| last.index() + 1);
        Ok(Splice {
            parent: collection.clone(),
            range: index..index,
            elements: detach(elements),
            action,
        })
    }

    /// `key` is missing from `mapping`: add it with the rest of the path below.
    fn add_entry(&self, mapping: &Mapping, depth: usize, value: &YamlValue) -> YamlResult<Splice> {
        if mapping.is_flow() {
            return Err(self.error("cannot add keys to a flow mapping"));
        }
        let keys = self.keys_from(depth)?;
        let column = column_of(mapping.syntax());
        let text = format!(
            "{}{}: ~\n{}",
            " ".repeat(column),
            PLACEHOLDER_KEY,
            self.render_nested(&keys, value, column)?
        );
        tracing::trace!(column, keys = ?keys, "creating missing keys");
        self.splice_after_last_entry(mapping.syntax(), SyntaxKind::MAPPING_ENTRY, &text, "create keys")
    }

    /// `entry` has no usable value (`key:`, `key: ~`, `key: []`): rewrite it
    /// with the rest of the path below, keeping the key text and comment.
    fn rebuild_entry(
        &self,
        mapping: &Mapping,
        entry: &MappingEntry,
        depth: usize,
        value: &YamlValue,
    ) -> YamlResult<Splice> {
        if mapping.is_flow() {
            return Err(self.error("cannot rewrite a value inside a flow mapping"));
        }
        let key = self.path.segments()[depth].as_key();
        let keys = self.keys_from(depth + 1)?;
        let raw_key = entry.raw_key().unwrap_or_else(|| key_text(&key));
        let trailing_comment = entry.trailing_comment();
        let column = column_of(entry.syntax());

        let entry_path = YamlPath::root().join(key.as_str());
        let prefix = keys
            .iter()
            .fold(entry_path.clone(), |path, key| path.join(key.as_str()))
            .join(0);
        let nested = nest(&keys, value);
        let rendered = self.render(&prefix, |builder| {
            builder.entry(&raw_key, &nested, column, &entry_path, trailing_comment.as_deref())
        })?;

        let text = format!("{}{}: ~\n{}", " ".repeat(column), PLACEHOLDER_KEY, rendered);
        let fragment = self.parse_fragment(&text)?;
        let replacement = fragment
            .descendants()
            .find(|node| node.kind() == SyntaxKind::MAPPING)
            .and_then(|node| {
                node.children()
                    .filter(|child| child.kind() == SyntaxKind::MAPPING_ENTRY)
                    .nth(1)
            })
            .ok_or_else(unexpected_fragment)?;

        let index = entry.syntax().index();
        Ok(Splice {
            parent: mapping.syntax().clone(),
            range: index..index + 1,
            elements: detach(vec![replacement.into()]),
            action: "rebuild empty entry",
        })
    }

    fn append_item(&self, sequence: &Sequence, value: &YamlValue) -> YamlResult<Splice> {
        let column = column_of(sequence.syntax());
        let item_path = YamlPath::root().join(0);
        let rendered = self.render(&item_path, |builder| {
            builder.sequence_item(value, column, &item_path)
        })?;
        let text = format!("{}- ~\n{}", " ".repeat(column), rendered);
        self.splice_after_last_entry(
            sequence.syntax(),
            SyntaxKind::SEQUENCE_ENTRY,
            &text,
            "append sequence item",
        )
    }

    fn append_flow_item(&self, sequence: &Sequence, value: &YamlValue) -> YamlResult<Splice> {
        if !self.comments.is_empty() {
            return Err(self.error("comments cannot be attached inside a flow sequence"));
        }
        let item = value.to_flow_string();
        let syntax = sequence.syntax();

        if !sequence.is_empty() {
            let splice = self.splice_after_last_entry(
                syntax,
                SyntaxKind::SEQUENCE_ENTRY,
                &format!("[~, {}]", item),
                "append flow item",
            )?;
            return Ok(Splice {
                elements: splice
                    .elements
                    .into_iter()
                    .take_while(|element| element.kind() != SyntaxKind::RIGHT_BRACKET)
                    .collect(),
                ..splice
            });
        }

        let fragment = self.parse_fragment(&format!("[{}]", item))?;
        let fragment_sequence = fragment
            .descendants()
            .find(|node| node.kind() == SyntaxKind::SEQUENCE)
            .ok_or_else(unexpected_fragment)?;
        let elements = fragment_sequence
            .children_with_tokens()
            .filter(|element| {
                !matches!(
                    element.kind(),
                    SyntaxKind::LEFT_BRACKET | SyntaxKind::RIGHT_BRACKET
                )
            })
            .collect();
        Ok(Splice {
            parent: syntax.clone(),
            range: 1..1,
            elements: detach(elements),
            action: "fill empty flow sequence",
        })
    }

    fn merge_entries(&self, mapping: &Mapping, value: &YamlValue) -> YamlResult<Splice> {
        let map = value
            .as_mapping()
            .ok_or_else(|| self.error("only a mapping can be appended to a mapping"))?;
        if let Some(key) = map.keys().find(|key| mapping.contains_key(key)) {
            return Err(YamlError::DuplicateKey(key.clone()));
        }
        let column = column_of(mapping.syntax());
        let rendered = self.render(&YamlPath::root(), |builder| {
            builder.mapping_entries(map, column, &YamlPath::root())
        })?;
        let text = format!("{}{}: ~\n{}", " ".repeat(column), PLACEHOLDER_KEY, rendered);
        self.splice_after_last_entry(mapping.syntax(), SyntaxKind::MAPPING_ENTRY, &text, "merge entries")
    }
}
