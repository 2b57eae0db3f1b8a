//! Token-to-event state machine: folds the lexer's token stream into a
//! well-formed [`Event`] stream while enforcing YAML's structural rules.
//!
//! `Parser<S>` owns a lexer, a continuation stack, and an accumulated
//! tag-directive table, and dispatches on token-driven state like a classic
//! scanner-backed parser — but implemented as recursive-descent over
//! `Token::start_mark.column` rather than a flat `ParserState` dispatch
//! loop: the call stack plays the role a `Vec<ParserState>` continuation
//! stack would, and this crate additionally pushes/pops an explicit
//! [`Ancestry`] (`Vec<Level>`) alongside every container entered/exited
//! purely for indentation bookkeeping (see `DESIGN.md` for why both
//! representations are kept).
//!
//! Scope note: a flow collection (`[...]`/`{...}`) is not accepted as a bare
//! implicit block-mapping key (only scalars and aliases are) — real-world
//! YAML essentially never uses one there; see `DESIGN.md`.

use std::collections::{HashMap, VecDeque};

use crate::byte_source::{ByteSource, Mark};
use crate::error::{ParserError, Positioned};
use crate::event::{AnchorId, AnchorTable, Event, EventData, ScalarStyle};
use crate::level::{Ancestry, Indentation, Level, LevelKind};
use crate::lexer::Lexer;
use crate::tag::{TagId, TagLibrary};
use crate::token::{ScalarToken, Token, TokenData};

#[derive(Debug)]
enum TagSpec {
    Shorthand { handle: String, suffix: String },
    Verbatim(String),
}

fn scalar_style(style: ScalarToken) -> ScalarStyle {
    match style {
        ScalarToken::Plain => ScalarStyle::Plain,
        ScalarToken::SingleQuoted => ScalarStyle::SingleQuoted,
        ScalarToken::DoubleQuoted => ScalarStyle::DoubleQuoted,
        ScalarToken::Literal => ScalarStyle::Literal,
        ScalarToken::Folded => ScalarStyle::Folded,
    }
}

enum DocState {
    BeforeDocument,
    Done,
}

/// Drives a [`Lexer`] and produces a well-formed [`Event`] sequence, one
/// document's worth of `StartDocument ..= EndDocument` at a time, across
/// every document in the source.
pub struct Parser<S> {
    lexer: Lexer<S>,
    tags: TagLibrary,
    anchors_by_name: HashMap<String, AnchorId>,
    anchor_table: AnchorTable,
    ancestry: Ancestry,
    tag_directives: Vec<(String, String)>,
    pending: VecDeque<Event>,
    lookahead: Option<Token>,
    last_mark: Mark,
    state: DocState,
}

impl<S: ByteSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Self::with_tag_library(source, TagLibrary::default())
    }

    pub fn with_tag_library(source: S, tags: TagLibrary) -> Self {
        Parser {
            lexer: Lexer::new(source),
            tags,
            anchors_by_name: HashMap::new(),
            anchor_table: AnchorTable::new(),
            ancestry: Ancestry::new(),
            tag_directives: Vec::new(),
            pending: VecDeque::new(),
            lookahead: None,
            last_mark: Mark::default(),
            state: DocState::BeforeDocument,
        }
    }

    /// Pull the next event, or `None` once the underlying source is
    /// exhausted (all documents consumed).
    pub fn next_event(&mut self) -> Result<Option<Event>, ParserError> {
        loop {
            if let Some(ev) = self.pending.pop_front() {
                return Ok(Some(ev));
            }
            if matches!(self.state, DocState::Done) {
                return Ok(None);
            }
            self.step()?;
        }
    }

    fn positioned(&self, problem: impl Into<String>, mark: Mark) -> ParserError {
        Positioned::new(problem, mark, self.lexer.current_line_text()).into()
    }

    fn fill(&mut self) -> Result<(), ParserError> {
        while self.lookahead.is_none() {
            let tok = self.lexer.next_token()?;
            if matches!(tok.data, TokenData::Indentation { .. } | TokenData::EmptyLine) {
                continue;
            }
            self.lookahead = Some(tok);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, ParserError> {
        self.fill()?;
        Ok(self.lookahead.as_ref().unwrap())
    }

    fn bump(&mut self) -> Result<Token, ParserError> {
        self.fill()?;
        let tok = self.lookahead.take().unwrap();
        self.last_mark = tok.end_mark;
        Ok(tok)
    }

    fn push(&mut self, data: EventData, start_mark: Mark) {
        self.pending.push_back(Event {
            data,
            start_mark,
            end_mark: start_mark,
        });
    }

    fn resolve_tag(&mut self, tag: Option<TagSpec>) -> TagId {
        match tag {
            None => TagId::UNRESOLVED,
            Some(TagSpec::Verbatim(v)) => self.tags.register(&v),
            Some(TagSpec::Shorthand { handle, suffix }) => {
                self.tags.register_shorthand(&handle, &suffix, &self.tag_directives)
            }
        }
    }

    fn resolve_anchor(&mut self, name: Option<String>) -> AnchorId {
        match name {
            None => AnchorId::NONE,
            Some(name) => {
                let id = self.anchor_table.allocate();
                self.anchors_by_name.insert(name, id);
                id
            }
        }
    }

    fn emit_scalar(
        &mut self,
        tag: Option<TagSpec>,
        anchor: Option<String>,
        content: String,
        style: Option<ScalarStyle>,
        mark: Mark,
    ) {
        let tag_id = self.resolve_tag(tag);
        let anchor_id = self.resolve_anchor(anchor);
        self.push(
            EventData::Scalar {
                tag: tag_id,
                anchor: anchor_id,
                content,
                style,
            },
            mark,
        );
    }

    fn emit_empty_scalar(&mut self, tag: Option<TagSpec>, anchor: Option<String>, mark: Mark) {
        self.emit_scalar(tag, anchor, String::new(), None, mark);
    }

    fn push_start_sequence(&mut self, tag: Option<TagSpec>, anchor: Option<String>, mark: Mark) {
        let tag_id = self.resolve_tag(tag);
        let anchor_id = self.resolve_anchor(anchor);
        self.push(EventData::StartSequence { tag: tag_id, anchor: anchor_id }, mark);
    }

    fn push_end_sequence(&mut self) {
        let mark = self.last_mark;
        self.push(EventData::EndSequence, mark);
    }

    fn push_start_mapping(&mut self, tag: Option<TagSpec>, anchor: Option<String>, mark: Mark) {
        let tag_id = self.resolve_tag(tag);
        let anchor_id = self.resolve_anchor(anchor);
        self.push(EventData::StartMapping { tag: tag_id, anchor: anchor_id }, mark);
    }

    fn push_end_mapping(&mut self) {
        let mark = self.last_mark;
        self.push(EventData::EndMapping, mark);
    }

    fn parse_alias(&mut self) -> Result<(), ParserError> {
        let tok = self.bump()?;
        let TokenData::Alias { value } = tok.data else {
            unreachable!()
        };
        let target = *self
            .anchors_by_name
            .get(&value)
            .ok_or_else(|| self.positioned(format!("unknown anchor '*{value}'"), tok.start_mark))?;
        self.push(EventData::Alias { target }, tok.start_mark);
        Ok(())
    }

    fn consume_props(&mut self) -> Result<(Option<TagSpec>, Option<String>), ParserError> {
        let mut tag = None;
        let mut anchor = None;
        loop {
            match &self.peek()?.data {
                TokenData::Tag { .. } => {
                    if tag.is_some() {
                        return Err(self.positioned("duplicate tag on a single node", self.peek()?.start_mark));
                    }
                    let tok = self.bump()?;
                    let TokenData::Tag { handle, suffix, .. } = tok.data else {
                        unreachable!()
                    };
                    tag = Some(TagSpec::Shorthand { handle, suffix });
                }
                TokenData::VerbatimTag { .. } => {
                    if tag.is_some() {
                        return Err(self.positioned("duplicate tag on a single node", self.peek()?.start_mark));
                    }
                    let tok = self.bump()?;
                    let TokenData::VerbatimTag { value } = tok.data else {
                        unreachable!()
                    };
                    tag = Some(TagSpec::Verbatim(value));
                }
                TokenData::Anchor { .. } => {
                    if anchor.is_some() {
                        return Err(self.positioned("duplicate anchor on a single node", self.peek()?.start_mark));
                    }
                    let tok = self.bump()?;
                    let TokenData::Anchor { value } = tok.data else {
                        unreachable!()
                    };
                    anchor = Some(value);
                }
                _ => break,
            }
        }
        Ok((tag, anchor))
    }

    // ---- block context ----

    /// Parse whatever node (if any) begins at or after `min_indent`. If the
    /// next token is indented less than `min_indent` (or is a token that can
    /// never start a node, e.g. a flow closer), this node is absent: an
    /// implicit empty scalar is produced without consuming that token.
    fn parse_node(&mut self, min_indent: u64) -> Result<(), ParserError> {
        let (tag, anchor) = self.consume_props()?;
        let tok = self.peek()?;
        let column = tok.start_mark.column;
        let mark = tok.start_mark;

        if column < min_indent {
            self.emit_empty_scalar(tag, anchor, mark);
            return Ok(());
        }

        match &tok.data {
            TokenData::SequenceEntry => self.parse_block_sequence(tag, anchor),
            TokenData::MapKey => self.parse_block_mapping_explicit(tag, anchor),
            TokenData::FlowSequenceStart => self.parse_flow_sequence(tag, anchor),
            TokenData::FlowMappingStart => self.parse_flow_mapping(tag, anchor),
            TokenData::Alias { .. } => {
                if tag.is_some() || anchor.is_some() {
                    return Err(self.positioned("an alias may not carry a tag or anchor", mark));
                }
                self.parse_alias()
            }
            TokenData::Scalar { .. } => self.parse_scalar_or_implicit_mapping(min_indent, tag, anchor),
            TokenData::DirectivesEnd
            | TokenData::DocumentEnd
            | TokenData::StreamEnd
            | TokenData::MapValue
            | TokenData::FlowEntry
            | TokenData::FlowSequenceEnd
            | TokenData::FlowMappingEnd => {
                self.emit_empty_scalar(tag, anchor, mark);
                Ok(())
            }
            other => Err(self.positioned(format!("unexpected token while scanning a node: {other:?}"), mark)),
        }
    }

    fn parse_scalar_or_implicit_mapping(
        &mut self,
        min_indent: u64,
        tag: Option<TagSpec>,
        anchor: Option<String>,
    ) -> Result<(), ParserError> {
        let key_tok = self.bump()?;
        let TokenData::Scalar { value, style } = key_tok.data else {
            unreachable!()
        };
        if matches!(self.peek()?.data, TokenData::MapValue) {
            self.push_start_mapping(tag, anchor, key_tok.start_mark);
            self.emit_scalar(None, None, value, Some(scalar_style(style)), key_tok.start_mark);
            self.bump()?; // ':'
            self.ancestry.push(Level::new(
                LevelKind::MapValue,
                Indentation::Column(key_tok.start_mark.column),
            ));
            self.parse_mapping_rest(key_tok.start_mark.column, min_indent)?;
            self.ancestry.pop();
            self.push_end_mapping();
            Ok(())
        } else {
            self.emit_scalar(tag, anchor, value, Some(scalar_style(style)), key_tok.start_mark);
            Ok(())
        }
    }

    /// After the first key/value pair of an implicit block mapping has
    /// already been emitted, read any further `key: value` pairs at the
    /// same column.
    fn parse_mapping_rest(&mut self, key_column: u64, outer_min_indent: u64) -> Result<(), ParserError> {
        self.parse_node(key_column.max(outer_min_indent) + 1)?;
        loop {
            let next = self.peek()?;
            if next.start_mark.column != key_column {
                break;
            }
            match &next.data {
                TokenData::Scalar { .. } => {
                    let key_tok = self.bump()?;
                    let TokenData::Scalar { value, style } = key_tok.data else {
                        unreachable!()
                    };
                    if !matches!(self.peek()?.data, TokenData::MapValue) {
                        return Err(self.positioned("expected ':' after mapping key", key_tok.start_mark));
                    }
                    self.emit_scalar(None, None, value, Some(scalar_style(style)), key_tok.start_mark);
                    self.bump()?;
                    self.parse_node(key_column + 1)?;
                }
                TokenData::MapKey => {
                    self.bump()?;
                    self.parse_node(key_column + 1)?;
                    if matches!(self.peek()?.data, TokenData::MapValue) {
                        self.bump()?;
                        self.parse_node(key_column + 1)?;
                    } else {
                        let mark = self.peek()?.start_mark;
                        self.emit_empty_scalar(None, None, mark);
                    }
                }
                TokenData::Anchor { .. } | TokenData::Tag { .. } | TokenData::VerbatimTag { .. } => {
                    let (tag, anchor) = self.consume_props()?;
                    self.parse_scalar_or_implicit_mapping_tail(key_column, tag, anchor)?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Like `parse_scalar_or_implicit_mapping`, but for a continuation key
    /// that already had its tag/anchor consumed by the caller.
    fn parse_scalar_or_implicit_mapping_tail(
        &mut self,
        key_column: u64,
        tag: Option<TagSpec>,
        anchor: Option<String>,
    ) -> Result<(), ParserError> {
        let key_tok = self.bump()?;
        let TokenData::Scalar { value, style } = key_tok.data else {
            return Err(self.positioned("expected a mapping key", key_tok.start_mark));
        };
        if !matches!(self.peek()?.data, TokenData::MapValue) {
            return Err(self.positioned("expected ':' after mapping key", key_tok.start_mark));
        }
        self.emit_scalar(tag, anchor, value, Some(scalar_style(style)), key_tok.start_mark);
        self.bump()?;
        self.parse_node(key_column + 1)
    }

    fn parse_block_sequence(&mut self, tag: Option<TagSpec>, anchor: Option<String>) -> Result<(), ParserError> {
        let first_mark = self.peek()?.start_mark;
        let column = first_mark.column;
        self.push_start_sequence(tag, anchor, first_mark);
        self.ancestry.push(Level::new(LevelKind::Sequence, Indentation::Column(column)));
        loop {
            self.bump()?; // '-'
            self.parse_node(column + 1)?;
            let next = self.peek()?;
            if next.start_mark.column == column && matches!(next.data, TokenData::SequenceEntry) {
                continue;
            }
            break;
        }
        self.ancestry.pop();
        self.push_end_sequence();
        Ok(())
    }

    fn parse_block_mapping_explicit(&mut self, tag: Option<TagSpec>, anchor: Option<String>) -> Result<(), ParserError> {
        let first_mark = self.peek()?.start_mark;
        let column = first_mark.column;
        self.push_start_mapping(tag, anchor, first_mark);
        self.ancestry.push(Level::new(LevelKind::MapKey, Indentation::Column(column)));
        loop {
            self.bump()?; // '?'
            self.parse_node(column + 1)?;
            if matches!(self.peek()?.data, TokenData::MapValue) {
                self.bump()?;
                self.parse_node(column + 1)?;
            } else {
                let mark = self.peek()?.start_mark;
                self.emit_empty_scalar(None, None, mark);
            }
            let next = self.peek()?;
            if next.start_mark.column == column && matches!(next.data, TokenData::MapKey) {
                continue;
            }
            break;
        }
        self.ancestry.pop();
        self.push_end_mapping();
        Ok(())
    }

    // ---- flow context ----

    fn parse_flow_sequence(&mut self, tag: Option<TagSpec>, anchor: Option<String>) -> Result<(), ParserError> {
        let start = self.bump()?;
        self.push_start_sequence(tag, anchor, start.start_mark);
        self.ancestry.push(Level::new(LevelKind::Sequence, Indentation::Unknown));
        if matches!(self.peek()?.data, TokenData::FlowSequenceEnd) {
            self.bump()?;
            self.ancestry.pop();
            self.push_end_sequence();
            return Ok(());
        }
        loop {
            self.parse_flow_entry()?;
            match self.peek()?.data {
                TokenData::FlowEntry => {
                    self.bump()?;
                    if matches!(self.peek()?.data, TokenData::FlowSequenceEnd) {
                        break;
                    }
                }
                TokenData::FlowSequenceEnd => break,
                _ => {
                    let mark = self.peek()?.start_mark;
                    return Err(self.positioned("expected ',' or ']' in flow sequence", mark));
                }
            }
        }
        self.bump()?; // ']'
        self.ancestry.pop();
        self.push_end_sequence();
        Ok(())
    }

    fn parse_flow_mapping(&mut self, tag: Option<TagSpec>, anchor: Option<String>) -> Result<(), ParserError> {
        let start = self.bump()?;
        self.push_start_mapping(tag, anchor, start.start_mark);
        self.ancestry.push(Level::new(LevelKind::MapKey, Indentation::Unknown));
        if matches!(self.peek()?.data, TokenData::FlowMappingEnd) {
            self.bump()?;
            self.ancestry.pop();
            self.push_end_mapping();
            return Ok(());
        }
        loop {
            self.parse_flow_mapping_pair()?;
            match self.peek()?.data {
                TokenData::FlowEntry => {
                    self.bump()?;
                    if matches!(self.peek()?.data, TokenData::FlowMappingEnd) {
                        break;
                    }
                }
                TokenData::FlowMappingEnd => break,
                _ => {
                    let mark = self.peek()?.start_mark;
                    return Err(self.positioned("expected ',' or '}' in flow mapping", mark));
                }
            }
        }
        self.bump()?; // '}'
        self.ancestry.pop();
        self.push_end_mapping();
        Ok(())
    }

    fn parse_flow_mapping_pair(&mut self) -> Result<(), ParserError> {
        let explicit = matches!(self.peek()?.data, TokenData::MapKey);
        if explicit {
            self.bump()?;
        }
        self.parse_flow_pair_value()?; // key
        if matches!(self.peek()?.data, TokenData::MapValue) {
            self.bump()?;
            self.parse_flow_pair_value()?; // value
        } else {
            let mark = self.peek()?.start_mark;
            self.emit_empty_scalar(None, None, mark);
        }
        Ok(())
    }

    /// One entry of a flow sequence: a bare node, or (if a plain/quoted
    /// scalar is immediately followed by `:`) an implicit single-pair map
    /// wrapping just that pair (the `SinglePairKey`/`SinglePairValue` level
    /// kinds).
    fn parse_flow_entry(&mut self) -> Result<(), ParserError> {
        if matches!(self.peek()?.data, TokenData::MapKey) {
            self.bump()?;
            self.ancestry
                .push(Level::new(LevelKind::SinglePairKey, Indentation::Unknown));
            let mark = self.peek()?.start_mark;
            self.push_start_mapping(None, None, mark);
            self.parse_flow_pair_value()?;
            if matches!(self.peek()?.data, TokenData::MapValue) {
                self.bump()?;
                self.parse_flow_pair_value()?;
            } else {
                let mark = self.peek()?.start_mark;
                self.emit_empty_scalar(None, None, mark);
            }
            self.push_end_mapping();
            self.ancestry.pop();
            return Ok(());
        }

        let (tag, anchor) = self.consume_props()?;
        match &self.peek()?.data {
            TokenData::Scalar { .. } => {
                let key_tok = self.bump()?;
                let TokenData::Scalar { value, style } = key_tok.data else {
                    unreachable!()
                };
                if matches!(self.peek()?.data, TokenData::MapValue) {
                    self.push_start_mapping(tag, anchor, key_tok.start_mark);
                    self.ancestry
                        .push(Level::new(LevelKind::SinglePairValue, Indentation::Unknown));
                    self.emit_scalar(None, None, value, Some(scalar_style(style)), key_tok.start_mark);
                    self.bump()?;
                    self.parse_flow_pair_value()?;
                    self.ancestry.pop();
                    self.push_end_mapping();
                } else {
                    self.emit_scalar(tag, anchor, value, Some(scalar_style(style)), key_tok.start_mark);
                }
                Ok(())
            }
            TokenData::Alias { .. } => {
                if tag.is_some() || anchor.is_some() {
                    let mark = self.peek()?.start_mark;
                    return Err(self.positioned("an alias may not carry a tag or anchor", mark));
                }
                self.parse_alias()
            }
            TokenData::FlowSequenceStart => self.parse_flow_sequence(tag, anchor),
            TokenData::FlowMappingStart => self.parse_flow_mapping(tag, anchor),
            _ => {
                let mark = self.peek()?.start_mark;
                self.emit_empty_scalar(tag, anchor, mark);
                Ok(())
            }
        }
    }

    /// A single flow node with no pair-wrapping of its own: used for a
    /// pair's key or value position once the pair itself is already open.
    fn parse_flow_pair_value(&mut self) -> Result<(), ParserError> {
        let (tag, anchor) = self.consume_props()?;
        match &self.peek()?.data {
            TokenData::Scalar { .. } => {
                let tok = self.bump()?;
                let TokenData::Scalar { value, style } = tok.data else {
                    unreachable!()
                };
                self.emit_scalar(tag, anchor, value, Some(scalar_style(style)), tok.start_mark);
                Ok(())
            }
            TokenData::Alias { .. } => {
                if tag.is_some() || anchor.is_some() {
                    let mark = self.peek()?.start_mark;
                    return Err(self.positioned("an alias may not carry a tag or anchor", mark));
                }
                self.parse_alias()
            }
            TokenData::FlowSequenceStart => self.parse_flow_sequence(tag, anchor),
            TokenData::FlowMappingStart => self.parse_flow_mapping(tag, anchor),
            _ => {
                let mark = self.peek()?.start_mark;
                self.emit_empty_scalar(tag, anchor, mark);
                Ok(())
            }
        }
    }

    // ---- document / stream framing ----

    fn step(&mut self) -> Result<(), ParserError> {
        loop {
            match &self.peek()?.data {
                TokenData::VersionDirective { major, minor } => {
                    let (major, minor) = (*major, *minor);
                    self.bump()?;
                    if major != 1 || minor != 2 {
                        log::warn!("document declares unsupported YAML version {major}.{minor}; parsing as 1.2");
                    }
                }
                TokenData::TagDirective { .. } => {
                    let tok = self.bump()?;
                    let TokenData::TagDirective { handle, prefix } = tok.data else {
                        unreachable!()
                    };
                    self.tag_directives.retain(|(h, _)| h != &handle);
                    self.tag_directives.push((handle, prefix));
                }
                TokenData::ReservedDirective { .. } => {
                    self.bump()?;
                }
                _ => break,
            }
        }

        match &self.peek()?.data {
            TokenData::StreamEnd => {
                self.state = DocState::Done;
                Ok(())
            }
            TokenData::DocumentEnd => {
                self.bump()?;
                Ok(())
            }
            TokenData::DirectivesEnd => {
                self.bump()?;
                self.open_document()
            }
            _ => self.open_document(),
        }
    }

    fn open_document(&mut self) -> Result<(), ParserError> {
        let mark = self.peek()?.start_mark;
        self.push(EventData::StartDocument, mark);
        self.ancestry.push(Level::new(LevelKind::Document, Indentation::Column(0)));
        self.parse_node(0)?;
        self.ancestry.pop();
        if matches!(self.peek()?.data, TokenData::DocumentEnd) {
            self.bump()?;
        }
        self.tag_directives.clear();
        let end_mark = self.last_mark;
        self.push(EventData::EndDocument, end_mark);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;

    fn events(input: &str) -> Vec<EventData> {
        let source = SliceSource::new(input.as_bytes()).unwrap();
        let mut parser = Parser::new(source);
        let mut out = Vec::new();
        while let Some(ev) = parser.next_event().unwrap() {
            out.push(ev.data);
        }
        out
    }

    fn scalar(v: &str) -> EventData {
        EventData::Scalar {
            tag: TagId::UNRESOLVED,
            anchor: AnchorId::NONE,
            content: v.to_string(),
            style: Some(ScalarStyle::Plain),
        }
    }

    #[test]
    fn flat_mapping() {
        let evs = events("foo: bar\nbaz: qux\n");
        assert!(matches!(evs[0], EventData::StartDocument));
        assert!(matches!(evs[1], EventData::StartMapping { .. }));
        assert_eq!(evs[2], scalar("foo"));
        assert_eq!(evs[3], scalar("bar"));
        assert_eq!(evs[4], scalar("baz"));
        assert_eq!(evs[5], scalar("qux"));
        assert!(matches!(evs[6], EventData::EndMapping));
        assert!(matches!(evs[7], EventData::EndDocument));
    }

    #[test]
    fn block_sequence_of_scalars() {
        let evs = events("- a\n- b\n- c\n");
        assert!(matches!(evs[1], EventData::StartSequence { .. }));
        assert_eq!(evs[2], scalar("a"));
        assert_eq!(evs[3], scalar("b"));
        assert_eq!(evs[4], scalar("c"));
        assert!(matches!(evs[5], EventData::EndSequence));
    }

    #[test]
    fn nested_mapping_under_sequence_item() {
        let evs = events("- key: value\n  key2: value2\n");
        assert!(matches!(evs[1], EventData::StartSequence { .. }));
        assert!(matches!(evs[2], EventData::StartMapping { .. }));
        assert_eq!(evs[3], scalar("key"));
        assert_eq!(evs[4], scalar("value"));
        assert_eq!(evs[5], scalar("key2"));
        assert_eq!(evs[6], scalar("value2"));
        assert!(matches!(evs[7], EventData::EndMapping));
        assert!(matches!(evs[8], EventData::EndSequence));
    }

    #[test]
    fn flow_sequence_and_mapping() {
        let evs = events("[1, 2, {a: 1}]\n");
        assert!(matches!(evs[1], EventData::StartSequence { .. }));
        assert_eq!(evs[2], scalar("1"));
        assert_eq!(evs[3], scalar("2"));
        assert!(matches!(evs[4], EventData::StartMapping { .. }));
        assert_eq!(evs[5], scalar("a"));
        assert_eq!(evs[6], scalar("1"));
        assert!(matches!(evs[7], EventData::EndMapping));
        assert!(matches!(evs[8], EventData::EndSequence));
    }

    #[test]
    fn anchor_and_alias_resolve_to_same_target() {
        let evs = events("- &a foo\n- *a\n");
        let EventData::Scalar { anchor, .. } = &evs[2] else {
            panic!("expected scalar")
        };
        let EventData::Alias { target } = &evs[3] else {
            panic!("expected alias")
        };
        assert_eq!(anchor, target);
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let source = SliceSource::new(b"*missing\n").unwrap();
        let mut parser = Parser::new(source);
        // The document's root node is parsed eagerly alongside StartDocument,
        // so the failure surfaces on the very first pull.
        assert!(parser.next_event().is_err());
    }

    #[test]
    fn multiple_documents_in_one_stream() {
        let evs = events("---\na\n---\nb\n");
        let starts = evs.iter().filter(|e| matches!(e, EventData::StartDocument)).count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn tag_shorthand_expands_against_secondary_prefix() {
        let source = SliceSource::new(b"!!str 42\n").unwrap();
        let mut parser = Parser::new(source);
        parser.next_event().unwrap(); // StartDocument
        let ev = parser.next_event().unwrap().unwrap();
        let EventData::Scalar { tag, .. } = ev.data else {
            panic!("expected scalar")
        };
        assert_eq!(parser.tags.uri(tag), crate::tag::STR_TAG);
    }
}
