//! Event-to-text renderer: five style presets, automatic scalar-style and
//! container-style selection, tag/anchor emission policy, JSON-mode
//! restrictions.
//!
//! Performs automatic scalar analysis (`Analysis`/`ScalarAnalysis`, the
//! `flow_plain_allowed` / `block_plain_allowed` / `single_quoted_allowed` /
//! `block_allowed` flags) on top of `canonical`/`best_width` knobs, and adds
//! a single named [`Style`] selector rather than a parallel renderer per
//! style. Operates over an already-buffered document slice (one
//! `StartDocument..=EndDocument` run) rather than a live stream, since both
//! the Tidy anchor pass and the container flow/block decision need to see
//! ahead to a node's matching End — this requires a two-pass buffer.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::error::{PresenterJsonError, PresenterOutputError};
use crate::event::{AnchorId, Event, EventData, ScalarStyle};
use crate::tag::{TagId, TagLibrary};
use crate::type_hint::{guess_type, TypeHint};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Style {
    /// Shortest legal rendering: flow everywhere, minimal tags/anchors.
    Minimal,
    /// Smart block/flow choice per container; the common default.
    Default,
    /// Fully tagged, flow throughout, one pair per line.
    Canonical,
    /// Flow, JSON-compatible scalars only.
    Json,
    /// Block style everywhere, never flow.
    BlockOnly,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Newline {
    Lf,
    CrLf,
    PlatformDefault,
}

impl Newline {
    fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
            Newline::PlatformDefault => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OutputVersion {
    V1_2,
    V1_1,
    None,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AnchorStyle {
    /// Never emit anchors; a hard error if any alias is present.
    None,
    /// Emit an anchor only on nodes a later alias actually references.
    Tidy,
    /// Emit an anchor on every anchored node, referenced or not.
    Always,
}

#[derive(Copy, Clone, Debug)]
pub struct PresenterOptions {
    pub style: Style,
    pub indent_step: u32,
    pub newlines: Newline,
    pub output_version: OutputVersion,
    pub anchor_style: AnchorStyle,
    pub max_line_length: u32,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        PresenterOptions {
            style: Style::Default,
            indent_step: 2,
            newlines: Newline::Lf,
            output_version: OutputVersion::None,
            anchor_style: AnchorStyle::Tidy,
            max_line_length: 80,
        }
    }
}

/// Soft budget: a container renders in flow if its approximate inline
/// length would be at or under this many columns.
const FLOW_WIDTH_BUDGET: usize = 60;

pub struct Presenter<W> {
    writer: W,
    options: PresenterOptions,
    anchor_names: HashMap<AnchorId, String>,
    next_anchor_ordinal: u32,
}

impl<W: Write> Presenter<W> {
    pub fn new(writer: W, options: PresenterOptions) -> Self {
        Presenter {
            writer,
            options,
            anchor_names: HashMap::new(),
            next_anchor_ordinal: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn nl(&mut self) -> Result<(), PresenterOutputError> {
        let s = self.options.newlines.as_str();
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn indent(&mut self, depth: u32) -> Result<(), PresenterOutputError> {
        let n = (depth * self.options.indent_step) as usize;
        self.writer.write_all(" ".repeat(n).as_bytes())?;
        Ok(())
    }

    fn anchor_name(&mut self, id: AnchorId) -> String {
        self.anchor_names
            .entry(id)
            .or_insert_with(|| {
                self.next_anchor_ordinal += 1;
                format!("a{}", self.next_anchor_ordinal)
            })
            .clone()
    }

    /// Render one full document (`StartDocument ..= EndDocument`).
    pub fn present_document(&mut self, events: &[Event], tags: &TagLibrary) -> Result<(), PresenterOutputError> {
        let referenced = self.referenced_anchors(events);
        if matches!(self.options.anchor_style, AnchorStyle::None) && !referenced.is_empty() {
            return Err(PresenterOutputError::Problem(
                "anchor_style is None but the event stream contains aliases",
            ));
        }

        match self.options.output_version {
            OutputVersion::V1_2 => {
                self.writer.write_all(b"%YAML 1.2")?;
                self.nl()?;
            }
            OutputVersion::V1_1 => {
                self.writer.write_all(b"%YAML 1.1")?;
                self.nl()?;
            }
            OutputVersion::None => {}
        }
        if matches!(self.options.style, Style::Canonical) || !matches!(self.options.output_version, OutputVersion::None)
        {
            self.writer.write_all(b"---")?;
            self.nl()?;
        }

        let mut idx = 1; // skip StartDocument
        self.render_node(events, &mut idx, 0, tags, &referenced, true)?;
        Ok(())
    }

    fn referenced_anchors(&self, events: &[Event]) -> HashSet<AnchorId> {
        events
            .iter()
            .filter_map(|e| match &e.data {
                EventData::Alias { target } => Some(*target),
                _ => None,
            })
            .collect()
    }

    fn skip_to_matching_end(&self, events: &[Event], idx: usize) -> usize {
        let mut depth = 0i32;
        let mut i = idx;
        loop {
            match &events[i].data {
                EventData::StartMapping { .. } | EventData::StartSequence { .. } => depth += 1,
                EventData::EndMapping | EventData::EndSequence => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Whether `events[idx..]` (a container's body, up to but excluding its
    /// matching End) should render in flow style under `Style::Default`.
    fn fits_in_flow(&self, events: &[Event], start: usize, end: usize) -> bool {
        let mut budget = 0usize;
        for ev in &events[start..end] {
            budget += match &ev.data {
                EventData::Scalar { content, .. } => content.chars().count() + 2,
                EventData::StartMapping { .. } | EventData::StartSequence { .. } => 2,
                EventData::Alias { .. } => 3,
                _ => 0,
            };
            if budget > FLOW_WIDTH_BUDGET {
                return false;
            }
        }
        true
    }

    fn want_flow(&self, events: &[Event], idx: usize, end: usize) -> bool {
        match self.options.style {
            Style::Minimal | Style::Json | Style::Canonical => true,
            Style::BlockOnly => false,
            Style::Default => self.fits_in_flow(events, idx + 1, end),
        }
    }

    fn tag_annotation(&self, tag: TagId, tags: &TagLibrary, is_json: bool) -> Option<String> {
        if is_json || tag == TagId::UNRESOLVED {
            return None;
        }
        if tag == TagId::NON_SPECIFIC {
            return Some("!".to_string());
        }
        if matches!(self.options.style, Style::Minimal) {
            return None;
        }
        let uri = tags.uri(tag);
        if let Some(suffix) = uri.strip_prefix(tags.secondary_prefix()) {
            if !suffix.is_empty() {
                return Some(format!("!!{suffix}"));
            }
        }
        if let Some(local) = uri.strip_prefix('!') {
            return Some(format!("!{local}"));
        }
        Some(format!("!<{uri}>"))
    }

    fn write_props(
        &mut self,
        tag: TagId,
        anchor: AnchorId,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
    ) -> Result<(), PresenterOutputError> {
        let is_json = matches!(self.options.style, Style::Json);
        let show_anchor = !anchor.is_none()
            && match self.options.anchor_style {
                AnchorStyle::None => false,
                AnchorStyle::Tidy => referenced.contains(&anchor),
                AnchorStyle::Always => true,
            }
            && !is_json;
        if show_anchor {
            let name = self.anchor_name(anchor);
            self.writer.write_all(format!("&{name} ").as_bytes())?;
        }
        if let Some(annotation) = self.tag_annotation(tag, tags, is_json) {
            self.writer.write_all(format!("{annotation} ").as_bytes())?;
        }
        Ok(())
    }

    fn render_node(
        &mut self,
        events: &[Event],
        idx: &mut usize,
        depth: u32,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
        at_line_start: bool,
    ) -> Result<(), PresenterOutputError> {
        let is_json = matches!(self.options.style, Style::Json);
        match &events[*idx].data {
            EventData::Scalar { tag, anchor, content, style } => {
                self.write_props(*tag, *anchor, tags, referenced)?;
                self.write_scalar(content, *style)?;
                *idx += 1;
                Ok(())
            }
            EventData::Alias { target } => {
                if is_json {
                    return Err(PresenterOutputError::Problem("JSON style cannot represent an alias"));
                }
                let name = self.anchor_name(*target);
                self.writer.write_all(format!("*{name}").as_bytes())?;
                *idx += 1;
                Ok(())
            }
            EventData::StartSequence { tag, anchor } => {
                let end = self.skip_to_matching_end(events, *idx);
                self.write_props(*tag, *anchor, tags, referenced)?;
                if self.want_flow(events, *idx, end) {
                    self.render_flow_sequence(events, idx, end, depth, tags, referenced)
                } else {
                    self.render_block_sequence(events, idx, end, depth, tags, referenced, at_line_start)
                }
            }
            EventData::StartMapping { tag, anchor } => {
                let end = self.skip_to_matching_end(events, *idx);
                self.write_props(*tag, *anchor, tags, referenced)?;
                if self.want_flow(events, *idx, end) {
                    self.render_flow_mapping(events, idx, end, depth, tags, referenced)
                } else {
                    self.render_block_mapping(events, idx, end, depth, tags, referenced, at_line_start)
                }
            }
            EventData::StartDocument | EventData::EndDocument | EventData::EndMapping | EventData::EndSequence => {
                Err(PresenterOutputError::Problem("unexpected event where a node was expected"))
            }
        }
    }

    fn render_flow_sequence(
        &mut self,
        events: &[Event],
        idx: &mut usize,
        end: usize,
        depth: u32,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
    ) -> Result<(), PresenterOutputError> {
        self.writer.write_all(b"[")?;
        *idx += 1;
        let mut first = true;
        while *idx < end {
            if !first {
                self.writer.write_all(b", ")?;
            }
            first = false;
            self.render_node(events, idx, depth + 1, tags, referenced, false)?;
        }
        self.writer.write_all(b"]")?;
        *idx = end + 1;
        Ok(())
    }

    fn render_flow_mapping(
        &mut self,
        events: &[Event],
        idx: &mut usize,
        end: usize,
        depth: u32,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
    ) -> Result<(), PresenterOutputError> {
        self.writer.write_all(b"{")?;
        *idx += 1;
        let mut first = true;
        while *idx < end {
            if !first {
                self.writer.write_all(b", ")?;
            }
            first = false;
            self.render_node(events, idx, depth + 1, tags, referenced, false)?;
            self.writer.write_all(b": ")?;
            self.render_node(events, idx, depth + 1, tags, referenced, false)?;
        }
        self.writer.write_all(b"}")?;
        *idx = end + 1;
        Ok(())
    }

    fn render_block_sequence(
        &mut self,
        events: &[Event],
        idx: &mut usize,
        end: usize,
        depth: u32,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
        at_line_start: bool,
    ) -> Result<(), PresenterOutputError> {
        *idx += 1; // StartSequence
        if *idx == end {
            self.writer.write_all(b"[]")?;
            *idx = end + 1;
            return Ok(());
        }
        let mut first = true;
        while *idx < end {
            if !(first && at_line_start) {
                self.nl()?;
                self.indent(depth)?;
            }
            first = false;
            self.writer.write_all(b"- ")?;
            self.render_node(events, idx, depth + 1, tags, referenced, true)?;
        }
        *idx = end + 1;
        Ok(())
    }

    fn render_block_mapping(
        &mut self,
        events: &[Event],
        idx: &mut usize,
        end: usize,
        depth: u32,
        tags: &TagLibrary,
        referenced: &HashSet<AnchorId>,
        at_line_start: bool,
    ) -> Result<(), PresenterOutputError> {
        *idx += 1; // StartMapping
        if *idx == end {
            self.writer.write_all(b"{}")?;
            *idx = end + 1;
            return Ok(());
        }
        let mut first = true;
        while *idx < end {
            if !(first && at_line_start) {
                self.nl()?;
                self.indent(depth)?;
            }
            first = false;
            self.render_node(events, idx, depth + 1, tags, referenced, false)?;
            self.writer.write_all(b": ")?;
            self.render_node(events, idx, depth + 1, tags, referenced, false)?;
        }
        *idx = end + 1;
        Ok(())
    }

    fn write_scalar(&mut self, content: &str, style: Option<ScalarStyle>) -> Result<(), PresenterOutputError> {
        if matches!(self.options.style, Style::Json) {
            return self.write_json_scalar(content);
        }
        let chosen = style.unwrap_or_else(|| choose_scalar_style(content));
        match chosen {
            ScalarStyle::Literal if !content.contains('\n') => {
                self.write_plain_or_quoted(content)
            }
            ScalarStyle::Literal => self.write_block_scalar(content, '|'),
            ScalarStyle::Folded if content.contains('\n') => self.write_block_scalar(content, '>'),
            ScalarStyle::SingleQuoted => self.write_single_quoted(content),
            ScalarStyle::DoubleQuoted => self.write_double_quoted(content),
            _ => self.write_plain_or_quoted(content),
        }
    }

    fn write_plain_or_quoted(&mut self, content: &str) -> Result<(), PresenterOutputError> {
        if plain_is_safe(content) {
            self.writer.write_all(content.as_bytes())?;
            Ok(())
        } else {
            self.write_double_quoted(content)
        }
    }

    fn write_single_quoted(&mut self, content: &str) -> Result<(), PresenterOutputError> {
        self.writer.write_all(b"'")?;
        self.writer.write_all(content.replace('\'', "''").as_bytes())?;
        self.writer.write_all(b"'")?;
        Ok(())
    }

    fn write_double_quoted(&mut self, content: &str) -> Result<(), PresenterOutputError> {
        self.writer.write_all(b"\"")?;
        self.writer.write_all(json_escape(content).as_bytes())?;
        self.writer.write_all(b"\"")?;
        Ok(())
    }

    fn write_block_scalar(&mut self, content: &str, indicator: char) -> Result<(), PresenterOutputError> {
        self.writer.write_all(format!("{indicator}").as_bytes())?;
        self.nl()?;
        for line in content.trim_end_matches('\n').split('\n') {
            self.writer.write_all(b"  ")?;
            self.writer.write_all(line.as_bytes())?;
            self.nl()?;
        }
        Ok(())
    }

    fn write_json_scalar(&mut self, content: &str) -> Result<(), PresenterOutputError> {
        match guess_type(content) {
            TypeHint::Null | TypeHint::Bool | TypeHint::Int | TypeHint::Float => {
                self.writer.write_all(content.as_bytes())?;
                Ok(())
            }
            TypeHint::Inf { .. } | TypeHint::NaN => Err(PresenterOutputError::Problem(
                "JSON style cannot represent an infinite or NaN scalar",
            )),
            TypeHint::Unknown => self.write_double_quoted(content),
        }
    }
}

/// Standalone JSON-mode scalar encoder, for callers (e.g. the DOM layer)
/// that want to validate before committing to a full presenter pass.
pub fn check_json_representable(content: &str) -> Result<(), PresenterJsonError> {
    match guess_type(content) {
        TypeHint::Inf { .. } | TypeHint::NaN => Err(PresenterJsonError::Message(format!(
            "scalar '{content}' is not JSON-representable"
        ))),
        _ => Ok(()),
    }
}

fn choose_scalar_style(content: &str) -> ScalarStyle {
    if content.is_empty() {
        return ScalarStyle::SingleQuoted;
    }
    if plain_is_safe(content) {
        ScalarStyle::Plain
    } else if content.contains('\n') {
        ScalarStyle::Literal
    } else {
        ScalarStyle::DoubleQuoted
    }
}

fn plain_is_safe(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    let first = content.chars().next().unwrap();
    if matches!(first, '!' | '&' | '*' | '?' | '|' | '>' | '%' | '@' | '`' | '"' | '\'' | '#' | ',' | '[' | ']' | '{' | '}' | '-' | ':' | ' ') {
        return false;
    }
    if content.starts_with(char::is_whitespace) || content.ends_with(char::is_whitespace) {
        return false;
    }
    if content.contains(": ") || content.ends_with(':') || content.contains(" #") {
        return false;
    }
    if content.chars().any(|c| c.is_control()) {
        return false;
    }
    true
}

fn json_escape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::event_stream::EventStream;
    use crate::parser::Parser;

    fn document_events(input: &str) -> (Vec<Event>, TagLibrary) {
        let parser = Parser::new(SliceSource::new(input.as_bytes()).unwrap());
        let mut stream = EventStream::new(parser);
        let mut events = Vec::new();
        while !stream.finished().unwrap() {
            events.push(stream.next().unwrap());
        }
        (events, TagLibrary::default())
    }

    #[test]
    fn default_style_renders_short_flow_mapping() {
        let (events, tags) = document_events("a: 1\nb: 2\n");
        let mut presenter = Presenter::new(Vec::new(), PresenterOptions::default());
        presenter.present_document(&events, &tags).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("a: 1"));
    }

    #[test]
    fn json_style_rejects_aliases() {
        let (events, tags) = document_events("- &a foo\n- *a\n");
        let options = PresenterOptions {
            style: Style::Json,
            ..Default::default()
        };
        let mut presenter = Presenter::new(Vec::new(), options);
        let result = presenter.present_document(&events, &tags);
        assert!(result.is_err());
    }

    #[test]
    fn none_anchor_style_errors_when_aliases_present() {
        let (events, tags) = document_events("- &a foo\n- *a\n");
        let options = PresenterOptions {
            anchor_style: AnchorStyle::None,
            ..Default::default()
        };
        let mut presenter = Presenter::new(Vec::new(), options);
        assert!(presenter.present_document(&events, &tags).is_err());
    }

    #[test]
    fn plain_scalar_safety_rejects_leading_indicator() {
        assert!(!plain_is_safe("- not safe"));
        assert!(!plain_is_safe(": not safe"));
        assert!(plain_is_safe("safe-ish"));
    }
}
