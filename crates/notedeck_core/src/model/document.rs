//! Parsed note documents, edit buffers and search suggestions.
//!
//! # Responsibility
//! - Parse note files into an owned markdown tree for renderers.
//! - Carry transient edit state between "new"/"edit" intents and save.
//!
//! # Invariants
//! - `NoteDocument::idx` mirrors the owning resource's index at parse time
//!   and is refreshed whenever the category is reindexed.
//! - Titles are file stems; editing a title never renames an existing file.

use crate::model::resource::note_title;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Node classification inside [`MarkdownAst`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstKind {
    Document,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock { language: Option<String> },
    List { ordered: bool },
    Item,
    Emphasis,
    Strong,
    Strikethrough,
    Link { destination: String },
    Image { destination: String },
    Table,
    TableRow,
    TableCell,
    Text,
    Code,
    Html,
    SoftBreak,
    HardBreak,
    Rule,
    TaskMarker { checked: bool },
    Other,
}

/// One node of the owned markdown tree. Leaves carry `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: AstKind,
    pub text: String,
    pub children: Vec<AstNode>,
}

impl AstNode {
    fn container(kind: AstKind) -> Self {
        Self {
            kind,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn leaf(kind: AstKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Concatenated text of this node's leaves.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.kind {
            AstKind::Text | AstKind::Code => out.push_str(&self.text),
            AstKind::SoftBreak | AstKind::HardBreak => out.push(' '),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Owned markdown syntax tree; decoupled from the source buffer lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownAst {
    pub root: AstNode,
}

impl MarkdownAst {
    pub fn parse(source: &str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut stack = vec![AstNode::container(AstKind::Document)];
        for event in Parser::new_ext(source, options) {
            match event {
                Event::Start(tag) => stack.push(AstNode::container(kind_for_tag(&tag))),
                Event::End(_) => close_top(&mut stack),
                Event::Text(text) => {
                    push_leaf(&mut stack, AstNode::leaf(AstKind::Text, text.to_string()));
                }
                Event::Code(text) => {
                    push_leaf(&mut stack, AstNode::leaf(AstKind::Code, text.to_string()));
                }
                Event::Html(text) | Event::InlineHtml(text) => {
                    push_leaf(&mut stack, AstNode::leaf(AstKind::Html, text.to_string()));
                }
                Event::SoftBreak => push_leaf(&mut stack, AstNode::leaf(AstKind::SoftBreak, "")),
                Event::HardBreak => push_leaf(&mut stack, AstNode::leaf(AstKind::HardBreak, "")),
                Event::Rule => push_leaf(&mut stack, AstNode::leaf(AstKind::Rule, "")),
                Event::TaskListMarker(checked) => push_leaf(
                    &mut stack,
                    AstNode::leaf(AstKind::TaskMarker { checked }, ""),
                ),
                _ => {}
            }
        }
        while stack.len() > 1 {
            close_top(&mut stack);
        }

        let root = stack
            .pop()
            .unwrap_or_else(|| AstNode::container(AstKind::Document));
        Self { root }
    }

    /// `(level, text)` of every heading in document order.
    pub fn headings(&self) -> Vec<(u8, String)> {
        let mut out = Vec::new();
        collect_headings(&self.root, &mut out);
        out
    }

    /// Number of top-level blocks.
    pub fn block_count(&self) -> usize {
        self.root.children.len()
    }
}

fn kind_for_tag(tag: &Tag<'_>) -> AstKind {
    match tag {
        Tag::Paragraph => AstKind::Paragraph,
        Tag::Heading { level, .. } => AstKind::Heading(heading_level(*level)),
        Tag::BlockQuote(_) => AstKind::BlockQuote,
        Tag::CodeBlock(CodeBlockKind::Fenced(lang)) if !lang.is_empty() => AstKind::CodeBlock {
            language: Some(lang.to_string()),
        },
        Tag::CodeBlock(_) => AstKind::CodeBlock { language: None },
        Tag::List(start) => AstKind::List {
            ordered: start.is_some(),
        },
        Tag::Item => AstKind::Item,
        Tag::Emphasis => AstKind::Emphasis,
        Tag::Strong => AstKind::Strong,
        Tag::Strikethrough => AstKind::Strikethrough,
        Tag::Link { dest_url, .. } => AstKind::Link {
            destination: dest_url.to_string(),
        },
        Tag::Image { dest_url, .. } => AstKind::Image {
            destination: dest_url.to_string(),
        },
        Tag::Table(_) => AstKind::Table,
        Tag::TableHead | Tag::TableRow => AstKind::TableRow,
        Tag::TableCell => AstKind::TableCell,
        _ => AstKind::Other,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn push_leaf(stack: &mut [AstNode], node: AstNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn close_top(stack: &mut Vec<AstNode>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(node) = stack.pop() {
        push_leaf(stack, node);
    }
}

fn collect_headings(node: &AstNode, out: &mut Vec<(u8, String)>) {
    if let AstKind::Heading(level) = node.kind {
        out.push((level, node.plain_text()));
    }
    for child in &node.children {
        collect_headings(child, out);
    }
}

/// Parsed form of one note file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDocument {
    pub category: String,
    pub title: String,
    pub raw_text: String,
    pub ast: MarkdownAst,
    pub filepath: PathBuf,
    pub idx: usize,
}

impl NoteDocument {
    /// Builds a document from already-loaded text.
    pub fn from_source(
        category: impl Into<String>,
        filepath: impl Into<PathBuf>,
        raw_text: impl Into<String>,
        idx: usize,
    ) -> Self {
        let filepath = filepath.into();
        let raw_text = raw_text.into();
        Self {
            category: category.into(),
            title: note_title(&filepath),
            ast: MarkdownAst::parse(&raw_text),
            raw_text,
            filepath,
            idx,
        }
    }

    /// Reads `path` as UTF-8 and parses it.
    ///
    /// # Errors
    /// - Propagates read failures; non UTF-8 content is `InvalidData`.
    pub fn parse_file(category: &str, path: &Path, idx: usize) -> io::Result<Self> {
        let raw_text = fs::read_to_string(path)?;
        Ok(Self::from_source(category, path, raw_text, idx))
    }
}

/// Transient edit buffer for the "new note" and "edit note" intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableNote {
    pub category: String,
    /// Index of the source note; `None` for a new note.
    pub idx: Option<usize>,
    /// File being edited; `None` for a new note.
    pub source_note: Option<PathBuf>,
    pub edit_title: String,
    pub edit_text: String,
}

impl EditableNote {
    /// Empty buffer for a note that does not exist yet.
    pub fn new_note(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            idx: None,
            source_note: None,
            edit_title: String::new(),
            edit_text: String::new(),
        }
    }

    /// Buffer pre-filled from an existing document.
    pub fn from_document(document: &NoteDocument) -> Self {
        Self {
            category: document.category.clone(),
            idx: Some(document.idx),
            source_note: Some(document.filepath.clone()),
            edit_title: document.title.clone(),
            edit_text: document.raw_text.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.source_note.is_none()
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub idx: usize,
}
