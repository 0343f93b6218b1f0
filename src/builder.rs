//! Block-style YAML emission for values that get spliced into a document.

use crate::path::YamlPath;
use crate::scalar::ScalarValue;
use crate::value::YamlValue;
use indexmap::IndexMap;

/// Writes [`YamlValue`]s as block YAML text at a given column.
///
/// Comments are attached by path: each one is written as `#` lines right
/// before the line that introduces the node at that path. Paths are relative
/// to whatever the caller passes as the base path of the top-level call.
pub(crate) struct BlockBuilder<'a> {
    out: String,
    step: usize,
    comments: &'a [(YamlPath, String)],
    placed: Vec<bool>,
}

impl<'a> BlockBuilder<'a> {
    pub(crate) fn new(step: usize, comments: &'a [(YamlPath, String)]) -> Self {
        Self {
            out: String::new(),
            step: step.max(1),
            comments,
            placed: vec![false; comments.len()],
        }
    }

    /// Write the entries of `map` at `column`. Comments for `path` itself go
    /// before the first entry.
    pub(crate) fn mapping_entries(&mut self, map: &IndexMap<String, YamlValue>, column: usize, path: &YamlPath) {
        self.write_comments(path, column);
        for (key, value) in map {
            self.entry(&key_text(key), value, column, &path.join(key.as_str()), None);
        }
    }

    /// Write `items` as block sequence entries with their dashes at `column`.
    pub(crate) fn sequence_items(&mut self, items: &[YamlValue], column: usize, path: &YamlPath) {
        self.write_comments(path, column);
        for (index, item) in items.iter().enumerate() {
            self.sequence_item(item, column, &path.join(index));
        }
    }

    /// Write one mapping entry. `raw_key` is the key as it appears in the text.
    pub(crate) fn entry(
        &mut self,
        raw_key: &str,
        value: &YamlValue,
        column: usize,
        path: &YamlPath,
        trailing_comment: Option<&str>,
    ) {
        self.write_comments(path, column);
        self.indent(column);
        self.out.push_str(raw_key);
        self.out.push(':');
        self.value_after_key(value, column, path, trailing_comment);
    }

    /// Write one sequence entry whose dash sits at `column`.
    pub(crate) fn sequence_item(&mut self, item: &YamlValue, column: usize, path: &YamlPath) {
        self.leading_comments(item, column, path);
        self.indent(column);
        self.out.push('-');
        self.item_content(item, column, path);
    }

    /// Finish writing. Fails with the index of the first comment that did
    /// not match any written node.
    pub(crate) fn finish(self) -> Result<String, usize> {
        match self.placed.iter().position(|placed| !placed) {
            Some(index) => Err(index),
            None => Ok(self.out),
        }
    }

    /// The written text, ignoring comment placement.
    pub(crate) fn into_text(self) -> String {
        self.out
    }

    fn value_after_key(
        &mut self,
        value: &YamlValue,
        column: usize,
        path: &YamlPath,
        trailing_comment: Option<&str>,
    ) {
        let child_column = column + self.step;
        match value {
            YamlValue::Scalar(scalar) => {
                self.out.push(' ');
                if scalar.is_block() {
                    let block = scalar.to_block_string(child_column);
                    self.push_block_scalar(&block, trailing_comment);
                } else {
                    self.out.push_str(&scalar.to_yaml_string());
                    self.push_trailing_comment(trailing_comment);
                }
            }
            YamlValue::Mapping(map) if map.is_empty() => {
                self.out.push_str(" {}");
                self.push_trailing_comment(trailing_comment);
            }
            YamlValue::Sequence(items) if items.is_empty() => {
                self.out.push_str(" []");
                self.push_trailing_comment(trailing_comment);
            }
            YamlValue::Mapping(map) => {
                self.push_trailing_comment(trailing_comment);
                for (key, value) in map {
                    self.entry(&key_text(key), value, child_column, &path.join(key.as_str()), None);
                }
            }
            YamlValue::Sequence(items) => {
                self.push_trailing_comment(trailing_comment);
                for (index, item) in items.iter().enumerate() {
                    self.sequence_item(item, child_column, &path.join(index));
                }
            }
        }
    }

    /// Content after a sequence dash. Mappings and sequences start on the
    /// dash line and continue two columns right of the dash.
    fn item_content(&mut self, item: &YamlValue, column: usize, path: &YamlPath) {
        let content_column = column + 2;
        match item {
            YamlValue::Scalar(scalar) => {
                self.out.push(' ');
                if scalar.is_block() {
                    let block = scalar.to_block_string(content_column);
                    self.push_block_scalar(&block, None);
                } else {
                    self.out.push_str(&scalar.to_yaml_string());
                    self.out.push('\n');
                }
            }
            YamlValue::Mapping(map) if map.is_empty() => self.out.push_str(" {}\n"),
            YamlValue::Sequence(items) if items.is_empty() => self.out.push_str(" []\n"),
            YamlValue::Mapping(map) => {
                self.out.push(' ');
                for (position, (key, value)) in map.iter().enumerate() {
                    let entry_path = path.join(key.as_str());
                    if position > 0 {
                        self.write_comments(&entry_path, content_column);
                        self.indent(content_column);
                    }
                    self.out.push_str(&key_text(key));
                    self.out.push(':');
                    self.value_after_key(value, content_column, &entry_path, None);
                }
            }
            YamlValue::Sequence(items) => {
                self.out.push(' ');
                for (index, sub_item) in items.iter().enumerate() {
                    let item_path = path.join(index);
                    if index > 0 {
                        self.leading_comments(sub_item, content_column, &item_path);
                        self.indent(content_column);
                    }
                    self.out.push('-');
                    self.item_content(sub_item, content_column, &item_path);
                }
            }
        }
    }

    /// Comments for a sequence item and for every node that shares its first
    /// line (`- name: x` sets both the item and its `name`).
    fn leading_comments(&mut self, item: &YamlValue, column: usize, path: &YamlPath) {
        self.write_comments(path, column);
        match item {
            YamlValue::Mapping(map) => {
                if let Some((key, _)) = map.first() {
                    self.write_comments(&path.join(key.as_str()), column);
                }
            }
            YamlValue::Sequence(items) => {
                if let Some(first) = items.first() {
                    self.leading_comments(first, column, &path.join(0));
                }
            }
            YamlValue::Scalar(_) => {}
        }
    }

    fn write_comments(&mut self, path: &YamlPath, column: usize) {
        for (index, (target, text)) in self.comments.iter().enumerate() {
            if self.placed[index] || !target.matches(path) {
                continue;
            }
            self.placed[index] = true;
            for line in comment_lines(text) {
                self.indent(column);
                self.out.push_str(&line);
                self.out.push('\n');
            }
        }
    }

    fn push_trailing_comment(&mut self, comment: Option<&str>) {
        if let Some(comment) = comment {
            self.out.push(' ');
            self.out.push_str(comment);
        }
        self.out.push('\n');
    }

    /// Write a rendered block scalar, keeping a trailing comment on the
    /// header line.
    fn push_block_scalar(&mut self, block: &str, trailing_comment: Option<&str>) {
        let (header, body) = block.split_once('\n').unwrap_or((block, ""));
        self.out.push_str(header);
        self.push_trailing_comment(trailing_comment);
        self.out.push_str(body);
        self.out.push('\n');
    }

    fn indent(&mut self, column: usize) {
        self.out.extend(std::iter::repeat(' ').take(column));
    }
}

/// Render a mapping key, quoting it when needed.
pub(crate) fn key_text(key: &str) -> String {
    let scalar = ScalarValue::new(key);
    if scalar.is_block() {
        ScalarValue::double_quoted(key).to_yaml_string()
    } else {
        scalar.to_yaml_string()
    }
}

/// Turn comment text into `#` lines, one per line of text.
pub(crate) fn comment_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec!["#".to_string()];
    }
    text.lines()
        .map(|line| {
            if line.is_empty() {
                "#".to_string()
            } else if line.starts_with([' ', '#']) {
                format!("#{}", line)
            } else {
                format!("# {}", line)
            }
        })
        .collect()
}
