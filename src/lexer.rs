//! Context-sensitive tokenizer: indentation-driven block syntax, flow
//! syntax, quoted and block scalars, tags, anchors, aliases, directives and
//! document markers.
//!
//! The character-level scanning rules (plain scalar boundaries, quoting and
//! escape tables, block scalar chomping/indentation, tag/anchor syntax)
//! follow the classic `yaml_parser_scan_plain_scalar` /
//! `yaml_parser_scan_block_scalar` / `yaml_parser_scan_tag` family of
//! algorithms, adapted from `VecDeque<char>` + raw index arithmetic over an
//! inline parser struct to calls against the [`ByteSource`] trait. The token
//! shapes and the block/flow dispatch loop emit raw indentation and
//! indicator tokens rather than resolving them into
//! `BlockSequenceStart`/`BlockMappingStart`/`BlockEnd` tokens here — see
//! `token.rs` for why.

use crate::byte_source::{ByteSource, Mark};
use crate::error::{LexerError, Positioned, ReaderError};
use crate::token::{Chomping, IndentIndicator, ScalarToken, Token, TokenData};
use std::collections::VecDeque;

fn is_break(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

fn is_breakz(ch: Option<char>) -> bool {
    ch.map(is_break).unwrap_or(true)
}

fn is_blankz(ch: Option<char>) -> bool {
    ch.map(|c| is_blank(c) || is_break(c)).unwrap_or(true)
}

fn is_flow_indicator(ch: char) -> bool {
    matches!(ch, ',' | '[' | ']' | '{' | '}')
}

fn is_anchor_char(ch: char) -> bool {
    !is_blankz(Some(ch)) && !is_flow_indicator(ch)
}

/// Recognizes YAML tokens over a [`ByteSource`], tracking indentation and
/// switching between block/flow modes.
pub struct Lexer<S> {
    source: S,
    flow_level: u32,
    /// True when the next token fetch must first resolve the start of a
    /// physical line (indentation / blank-line detection) before scanning
    /// content.
    at_line_start: bool,
    /// True until the first non-directive, non-blank-line content has been
    /// seen; directives are only legal before this point (or right after a
    /// `---`/`...` marker, which resets it).
    directives_allowed: bool,
    /// Column of the current physical line's first non-space byte (the most
    /// recent `Indentation` token), i.e. the indentation of whatever
    /// construct (key, sequence entry, ...) opened this line — not the
    /// column of whatever token is being scanned within it. A block
    /// scalar's auto-detected content indentation is measured from this,
    /// never from the column of the `|`/`>` indicator itself.
    current_line_indent: u64,
    stream_ended: bool,
    pending: VecDeque<Token>,
}

impl<S: ByteSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Lexer {
            source,
            flow_level: 0,
            at_line_start: true,
            directives_allowed: true,
            current_line_indent: 0,
            stream_ended: false,
            pending: VecDeque::new(),
        }
    }

    /// Tell the lexer whether subsequent tokens are inside flow context.
    /// Flow brackets already toggle this internally; exposed so a parser
    /// can force flow semantics for constructs (e.g. a single-pair map
    /// nested in a flow sequence) the bracket counter alone would not flag.
    pub fn set_flow(&mut self, flow: bool) {
        self.flow_level = if flow { self.flow_level.max(1) } else { 0 };
    }

    pub fn is_flow(&self) -> bool {
        self.flow_level > 0
    }

    /// The text of the line currently being scanned, for error reporting.
    pub fn current_line_text(&self) -> String {
        self.source.current_line_text()
    }

    /// No-op hook kept for interface parity with callers that expect a
    /// separate "resume inline lexing" step: this lexer resolves a block
    /// scalar's header and body in one atomic `next_token()` call (see
    /// module docs), so there is nothing left to do here.
    pub fn end_block_scalar(&mut self) {}

    fn mark(&self) -> Mark {
        self.source.mark()
    }

    fn err(&self, problem: impl Into<String>) -> LexerError {
        Positioned::new(problem, self.mark(), self.source.current_line_text()).into()
    }

    fn peek(&mut self, offset: usize) -> Result<Option<char>, ReaderError> {
        self.source.peek(offset)
    }

    fn peek0(&mut self) -> Result<Option<char>, ReaderError> {
        self.peek(0)
    }

    fn advance(&mut self, n: usize) -> Result<(), ReaderError> {
        self.source.advance(n)
    }

    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return Ok(tok);
            }
            self.fetch_more_tokens()?;
        }
    }

    fn push(&mut self, start: Mark, data: TokenData) {
        self.pending.push_back(Token {
            data,
            start_mark: start,
            end_mark: self.mark(),
        });
    }

    fn fetch_more_tokens(&mut self) -> Result<(), LexerError> {
        if self.stream_ended {
            self.push(self.mark(), TokenData::StreamEnd);
            return Ok(());
        }

        if self.at_line_start {
            if self.scan_line_start()? {
                // Queued an Indentation or EmptyLine token; let the caller
                // drain it before we look at content.
                return Ok(());
            }
        }

        self.skip_blanks_and_comments()?;

        let start = self.mark();
        let Some(ch) = self.peek0()? else {
            self.stream_ended = true;
            self.push(start, TokenData::StreamEnd);
            return Ok(());
        };

        if start.column == 0 && ch == '%' {
            return self.scan_directive(start);
        }
        if start.column == 0 && self.at_document_marker("---")? {
            self.advance(3)?;
            self.directives_allowed = false;
            self.push(start, TokenData::DirectivesEnd);
            return Ok(());
        }
        if start.column == 0 && self.at_document_marker("...")? {
            self.advance(3)?;
            self.directives_allowed = true;
            self.push(start, TokenData::DocumentEnd);
            return Ok(());
        }

        self.directives_allowed = false;

        match ch {
            '-' if self.flow_level == 0 && is_blankz(self.peek(1)?) => {
                self.advance(1)?;
                self.push(start, TokenData::SequenceEntry);
                Ok(())
            }
            '?' if self.flow_level > 0 || is_blankz(self.peek(1)?) => {
                self.advance(1)?;
                self.push(start, TokenData::MapKey);
                Ok(())
            }
            ':' if self.flow_level > 0 || is_blankz(self.peek(1)?) => {
                self.advance(1)?;
                self.push(start, TokenData::MapValue);
                Ok(())
            }
            ',' if self.flow_level > 0 => {
                self.advance(1)?;
                self.push(start, TokenData::FlowEntry);
                Ok(())
            }
            '[' => {
                self.advance(1)?;
                self.flow_level += 1;
                self.push(start, TokenData::FlowSequenceStart);
                Ok(())
            }
            ']' => {
                self.advance(1)?;
                self.flow_level = self.flow_level.saturating_sub(1);
                self.push(start, TokenData::FlowSequenceEnd);
                Ok(())
            }
            '{' => {
                self.advance(1)?;
                self.flow_level += 1;
                self.push(start, TokenData::FlowMappingStart);
                Ok(())
            }
            '}' => {
                self.advance(1)?;
                self.flow_level = self.flow_level.saturating_sub(1);
                self.push(start, TokenData::FlowMappingEnd);
                Ok(())
            }
            '&' => self.scan_anchor_or_alias(start, false),
            '*' => self.scan_anchor_or_alias(start, true),
            '!' => self.scan_tag(start),
            '|' | '>' => self.scan_block_scalar(start, ch == '>'),
            '\'' => self.scan_single_quoted(start),
            '"' => self.scan_double_quoted(start),
            _ => self.scan_plain_scalar(start),
        }
    }

    /// Returns `true` if it queued an `Indentation`/`EmptyLine` token and
    /// the caller should return control before scanning content.
    fn scan_line_start(&mut self) -> Result<bool, LexerError> {
        self.at_line_start = false;
        let start = self.mark();
        let mut column = 0u64;
        let mut saw_tab = false;
        loop {
            match self.peek(column as usize)? {
                Some(' ') => column += 1,
                Some('\t') => {
                    saw_tab = true;
                    break;
                }
                _ => break,
            }
        }
        let after = self.peek(column as usize)?;
        if after.is_none() && !saw_tab {
            // True end of input: consume any trailing spaces and let the
            // caller's normal end-of-stream check in `fetch_more_tokens`
            // fire, rather than emitting an EmptyLine that would never stop
            // recurring.
            self.advance(column as usize)?;
            return Ok(false);
        }
        if is_breakz(after) && !saw_tab {
            // A blank line: consume the spaces and the break, emit
            // EmptyLine, and let the caller loop back to resolve the
            // *next* line's start.
            self.advance(column as usize)?;
            self.consume_break()?;
            self.push(start, TokenData::EmptyLine);
            self.at_line_start = true;
            return Ok(true);
        }
        if saw_tab {
            // A tab is only illegal when it falls inside what would be the
            // structural indentation run; once content (even more blanks
            // destined to be skipped as inter-token whitespace) has been
            // reached it is harmless here, so only error if this run is
            // the entire leading whitespace of the line, i.e. `column`
            // bytes in, we hit a tab before any non-blank character.
            return Err(self.err("tab character used for indentation"));
        }
        self.advance(column as usize)?;
        self.current_line_indent = column;
        self.push(start, TokenData::Indentation { column });
        Ok(true)
    }

    fn consume_break(&mut self) -> Result<(), LexerError> {
        if self.peek0()? == Some('\r') && self.peek(1)? == Some('\n') {
            self.advance(2)?;
        } else {
            self.advance(1)?;
        }
        Ok(())
    }

    fn skip_blanks_and_comments(&mut self) -> Result<(), LexerError> {
        loop {
            while matches!(self.peek0()?, Some(' ')) || (self.flow_level > 0 && matches!(self.peek0()?, Some('\t')))
            {
                self.advance(1)?;
            }
            if matches!(self.peek0()?, Some('\t')) {
                // A blank separator tab outside of indentation is legal.
                self.advance(1)?;
                continue;
            }
            if matches!(self.peek0()?, Some('#')) {
                while !is_breakz(self.peek0()?) {
                    self.advance(1)?;
                }
            }
            if is_break(self.peek0()?.unwrap_or('\0')) && self.peek0()?.is_some() {
                self.consume_break()?;
                self.at_line_start = true;
                return Ok(());
            }
            return Ok(());
        }
    }

    fn at_document_marker(&mut self, marker: &str) -> Result<bool, ReaderError> {
        for (i, expect) in marker.chars().enumerate() {
            if self.peek(i)? != Some(expect) {
                return Ok(false);
            }
        }
        Ok(is_blankz(self.peek(marker.len())?))
    }

    fn scan_directive(&mut self, start: Mark) -> Result<(), LexerError> {
        if !self.directives_allowed {
            return Err(self.err("directive not allowed here"));
        }
        self.advance(1)?; // '%'
        let mut name = String::new();
        while matches!(self.peek0()?, Some(c) if !is_blankz(Some(c))) {
            name.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        match name.as_str() {
            "YAML" => {
                self.skip_inline_blanks()?;
                let major = self.scan_version_number()?;
                if self.peek0()? != Some('.') {
                    return Err(self.err("expected a digit and '.' in version directive"));
                }
                self.advance(1)?;
                let minor = self.scan_version_number()?;
                if major != 1 {
                    log::warn!("unsupported YAML directive major version {major}.{minor}; continuing");
                } else if minor != 2 {
                    log::warn!("non-1.2 YAML directive version {major}.{minor}; continuing");
                }
                self.finish_directive_line()?;
                self.push(start, TokenData::VersionDirective { major, minor });
            }
            "TAG" => {
                self.skip_inline_blanks()?;
                let handle = self.scan_tag_handle()?;
                self.skip_inline_blanks()?;
                let prefix = self.scan_tag_prefix()?;
                self.finish_directive_line()?;
                self.push(start, TokenData::TagDirective { handle, prefix });
            }
            _ => {
                self.finish_directive_line()?;
                self.push(start, TokenData::ReservedDirective { name });
            }
        }
        Ok(())
    }

    fn skip_inline_blanks(&mut self) -> Result<(), LexerError> {
        while matches!(self.peek0()?, Some(c) if is_blank(c)) {
            self.advance(1)?;
        }
        Ok(())
    }

    fn finish_directive_line(&mut self) -> Result<(), LexerError> {
        self.skip_inline_blanks()?;
        if matches!(self.peek0()?, Some('#')) {
            while !is_breakz(self.peek0()?) {
                self.advance(1)?;
            }
        }
        if !is_breakz(self.peek0()?) {
            return Err(self.err("unexpected content at end of directive line"));
        }
        if self.peek0()?.is_some() {
            self.consume_break()?;
        }
        self.at_line_start = true;
        Ok(())
    }

    fn scan_version_number(&mut self) -> Result<u32, LexerError> {
        let mut digits = String::new();
        while matches!(self.peek0()?, Some(c) if c.is_ascii_digit()) {
            digits.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        if digits.is_empty() {
            return Err(self.err("expected a version number"));
        }
        digits.parse().map_err(|_| self.err("version number out of range"))
    }

    fn scan_tag_handle(&mut self) -> Result<String, LexerError> {
        if self.peek0()? != Some('!') {
            return Err(self.err("tag handle must start with '!'"));
        }
        let mut handle = String::from("!");
        self.advance(1)?;
        while matches!(self.peek0()?, Some(c) if c.is_ascii_alphanumeric() || c == '-') {
            handle.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        if self.peek0()? == Some('!') {
            handle.push('!');
            self.advance(1)?;
        }
        Ok(handle)
    }

    fn scan_tag_prefix(&mut self) -> Result<String, LexerError> {
        let mut prefix = String::new();
        while matches!(self.peek0()?, Some(c) if !is_blankz(Some(c))) {
            prefix.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        if prefix.is_empty() {
            return Err(self.err("expected a tag prefix"));
        }
        Ok(prefix)
    }

    fn scan_anchor_or_alias(&mut self, start: Mark, is_alias: bool) -> Result<(), LexerError> {
        self.advance(1)?;
        let mut value = String::new();
        while matches!(self.peek0()?, Some(c) if is_anchor_char(c)) {
            value.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        if value.is_empty() {
            return Err(self.err("anchor/alias name may not be empty"));
        }
        self.push(
            start,
            if is_alias {
                TokenData::Alias { value }
            } else {
                TokenData::Anchor { value }
            },
        );
        Ok(())
    }

    fn scan_tag(&mut self, start: Mark) -> Result<(), LexerError> {
        self.advance(1)?; // '!'
        if self.peek0()? == Some('<') {
            self.advance(1)?;
            let mut value = String::new();
            while !matches!(self.peek0()?, Some('>') | None) {
                value.push(self.peek0()?.unwrap());
                self.advance(1)?;
            }
            if self.peek0()? != Some('>') {
                return Err(self.err("unterminated verbatim tag"));
            }
            self.advance(1)?;
            if value.is_empty() {
                return Err(self.err("verbatim tag may not be empty"));
            }
            self.push(start, TokenData::VerbatimTag { value });
            return Ok(());
        }

        // Either `!` (bare), `!!suffix` (secondary handle), `!suffix`
        // (primary handle), or `!handle!suffix` (named handle).
        let mut handle = String::from("!");
        let mut shorthand_end = 1usize;
        if self.peek0()? == Some('!') {
            self.advance(1)?;
            handle.push('!');
            shorthand_end = 2;
        } else if matches!(self.peek0()?, Some(c) if c.is_ascii_alphanumeric() || c == '-') {
            let mut lookahead = String::new();
            let mut i = 0usize;
            loop {
                match self.peek(i)? {
                    Some(c) if c.is_ascii_alphanumeric() || c == '-' => {
                        lookahead.push(c);
                        i += 1;
                    }
                    Some('!') => {
                        handle.push_str(&lookahead);
                        handle.push('!');
                        shorthand_end = handle.len();
                        self.advance(i + 1)?;
                        break;
                    }
                    _ => {
                        // No second '!': this is a primary-handle shorthand
                        // `!suffix`, handle stays "!".
                        break;
                    }
                }
            }
        }
        let mut suffix = String::new();
        while matches!(self.peek0()?, Some(c) if is_anchor_char(c)) {
            suffix.push(self.peek0()?.unwrap());
            self.advance(1)?;
        }
        self.push(
            start,
            TokenData::Tag {
                handle,
                suffix,
                shorthand_end,
            },
        );
        Ok(())
    }

    fn scan_block_scalar(&mut self, start: Mark, folded: bool) -> Result<(), LexerError> {
        self.advance(1)?; // '|' or '>'
        let mut chomp = Chomping::Clip;
        let mut indent = IndentIndicator::Auto;
        let mut saw_chomp = false;
        let mut saw_indent = false;
        loop {
            match self.peek0()? {
                Some('+') | Some('-') if !saw_chomp => {
                    chomp = if self.peek0()? == Some('+') {
                        Chomping::Keep
                    } else {
                        Chomping::Strip
                    };
                    saw_chomp = true;
                    self.advance(1)?;
                }
                Some(c) if c.is_ascii_digit() && c != '0' && !saw_indent => {
                    indent = IndentIndicator::Explicit(c as u8 - b'0');
                    saw_indent = true;
                    self.advance(1)?;
                }
                _ => break,
            }
        }
        self.finish_directive_line()?;

        // Determine the base indentation: the indentation of the line the
        // block scalar header opened on, not the column of the `|`/`>`
        // indicator itself (which sits well to the right of that for a
        // mapping-value or sequence-entry block scalar).
        let header_column = self.current_line_indent;
        let declared_indent = match indent {
            IndentIndicator::Explicit(n) => Some(header_column + n as u64),
            IndentIndicator::Auto => None,
        };

        let mut lines: Vec<String> = Vec::new();
        let mut block_indent: Option<u64> = declared_indent;
        let mut trailing_blank_lines = 0u32;
        let mut first_content_seen = false;

        loop {
            // Measure this line's indentation.
            let mut col = 0u64;
            while self.peek(col as usize)? == Some(' ') {
                col += 1;
            }
            let after = self.peek(col as usize)?;
            if is_breakz(after) {
                if after.is_none() {
                    self.advance(col as usize)?;
                    break;
                }
                // Blank line inside (or before) the block scalar.
                self.advance(col as usize)?;
                self.consume_break()?;
                if first_content_seen {
                    lines.push(String::new());
                    trailing_blank_lines += 1;
                }
                continue;
            }
            if block_indent.is_some_and(|min| col < min) {
                break;
            }
            if block_indent.is_none() {
                if col <= header_column {
                    break;
                }
                block_indent = Some(col);
            }
            let indent_now = block_indent.unwrap();
            let extra = col - indent_now;
            self.advance(indent_now as usize)?;
            let mut text = " ".repeat(extra as usize);
            while !is_breakz(self.peek0()?) {
                text.push(self.peek0()?.unwrap());
                self.advance(1)?;
            }
            if self.peek0()?.is_some() {
                self.consume_break()?;
            }
            lines.push(text);
            first_content_seen = true;
            trailing_blank_lines = 0;
        }

        let body = render_block_scalar(&lines, folded, chomp, trailing_blank_lines);
        self.at_line_start = true;
        self.push(
            start,
            TokenData::Scalar {
                value: body,
                style: if folded { ScalarToken::Folded } else { ScalarToken::Literal },
            },
        );
        Ok(())
    }

    fn scan_single_quoted(&mut self, start: Mark) -> Result<(), LexerError> {
        self.advance(1)?;
        let mut value = String::new();
        let mut pending_breaks: Vec<()> = Vec::new();
        let mut leading_blanks = false;
        loop {
            match self.peek0()? {
                None => return Err(self.err("unterminated single-quoted scalar")),
                Some('\'') if self.peek(1)? == Some('\'') => {
                    flush_fold(&mut value, &mut pending_breaks, leading_blanks);
                    leading_blanks = false;
                    value.push('\'');
                    self.advance(2)?;
                }
                Some('\'') => {
                    self.advance(1)?;
                    break;
                }
                Some(c) if is_break(c) => {
                    pending_breaks.push(());
                    self.consume_break()?;
                    leading_blanks = true;
                }
                Some(c) if is_blank(c) && leading_blanks => {
                    self.advance(1)?;
                }
                Some(c) => {
                    flush_fold(&mut value, &mut pending_breaks, leading_blanks);
                    leading_blanks = false;
                    value.push(c);
                    self.advance(1)?;
                }
            }
        }
        self.push(
            start,
            TokenData::Scalar {
                value,
                style: ScalarToken::SingleQuoted,
            },
        );
        Ok(())
    }

    fn scan_double_quoted(&mut self, start: Mark) -> Result<(), LexerError> {
        self.advance(1)?;
        let mut value = String::new();
        let mut pending_breaks: Vec<()> = Vec::new();
        let mut leading_blanks = false;
        loop {
            match self.peek0()? {
                None => return Err(self.err("unterminated double-quoted scalar")),
                Some('"') => {
                    self.advance(1)?;
                    break;
                }
                Some('\\') if is_break(self.peek(1)?.unwrap_or('\0')) => {
                    self.advance(1)?;
                    self.consume_break()?;
                    leading_blanks = true;
                }
                Some('\\') => {
                    flush_fold(&mut value, &mut pending_breaks, leading_blanks);
                    leading_blanks = false;
                    self.advance(1)?;
                    self.scan_escape(&mut value)?;
                }
                Some(c) if is_break(c) => {
                    pending_breaks.push(());
                    self.consume_break()?;
                    leading_blanks = true;
                }
                Some(c) if is_blank(c) && leading_blanks => {
                    self.advance(1)?;
                }
                Some(c) => {
                    flush_fold(&mut value, &mut pending_breaks, leading_blanks);
                    leading_blanks = false;
                    value.push(c);
                    self.advance(1)?;
                }
            }
        }
        self.push(
            start,
            TokenData::Scalar {
                value,
                style: ScalarToken::DoubleQuoted,
            },
        );
        Ok(())
    }

    fn scan_escape(&mut self, value: &mut String) -> Result<(), LexerError> {
        let Some(c) = self.peek0()? else {
            return Err(self.err("unterminated escape sequence"));
        };
        let simple = match c {
            '0' => Some('\0'),
            'a' => Some('\u{7}'),
            'b' => Some('\u{8}'),
            't' | '\t' => Some('\t'),
            'n' => Some('\n'),
            'v' => Some('\u{B}'),
            'f' => Some('\u{C}'),
            'r' => Some('\r'),
            'e' => Some('\u{1B}'),
            '"' => Some('"'),
            '/' => Some('/'),
            '\\' => Some('\\'),
            'N' => Some('\u{85}'),
            '_' => Some('\u{A0}'),
            'L' => Some('\u{2028}'),
            'P' => Some('\u{2029}'),
            _ => None,
        };
        if let Some(ch) = simple {
            value.push(ch);
            self.advance(1)?;
            return Ok(());
        }
        let width = match c {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => return Err(self.err("invalid escape sequence")),
        };
        self.advance(1)?;
        let mut code = 0u32;
        for i in 0..width {
            let Some(h) = self.peek(i)?.and_then(|c| c.to_digit(16)) else {
                return Err(self.err("invalid hex digit in escape sequence"));
            };
            code = code * 16 + h;
        }
        self.advance(width)?;
        let ch = char::from_u32(code).ok_or_else(|| self.err("escape sequence is not a valid Unicode scalar value"))?;
        value.push(ch);
        Ok(())
    }

    fn scan_plain_scalar(&mut self, start: Mark) -> Result<(), LexerError> {
        let mut value = String::new();
        let mut pending_breaks: Vec<()> = Vec::new();
        let mut leading_blanks = false;
        let mut trailing_spaces = String::new();
        loop {
            let Some(c) = self.peek0()? else { break };
            if is_break(c) {
                break;
            }
            if c == ' ' {
                // Defer: only keep this run if followed by more content on
                // this line; trim if it leads into a break or comment.
                let mut look = 0usize;
                while self.peek(look)? == Some(' ') {
                    look += 1;
                }
                let after = self.peek(look)?;
                if is_breakz(after) || after == Some('#') {
                    self.advance(look)?;
                    break;
                }
                trailing_spaces = " ".repeat(look);
                self.advance(look)?;
                continue;
            }
            if c == '#' {
                // only a comment if preceded by whitespace, which is the
                // branch above; reaching here means no preceding blank.
            }
            if c == ':' {
                let after = self.peek(1)?;
                let stops = is_blankz(after)
                    || (self.flow_level > 0 && after.map(is_flow_indicator).unwrap_or(false));
                if stops {
                    break;
                }
            }
            if self.flow_level > 0 && is_flow_indicator(c) {
                break;
            }
            if !trailing_spaces.is_empty() {
                value.push_str(&trailing_spaces);
                trailing_spaces.clear();
            }
            flush_fold(&mut value, &mut pending_breaks, leading_blanks);
            leading_blanks = false;
            value.push(c);
            self.advance(1)?;
        }
        if value.is_empty() {
            return Err(self.err("unexpected character while scanning a plain scalar"));
        }
        self.push(
            start,
            TokenData::Scalar {
                value,
                style: ScalarToken::Plain,
            },
        );
        Ok(())
    }
}

/// Single-line-break -> space, N>1 breaks -> N-1 breaks; shared by
/// single-quoted, double-quoted, and plain scalars.
fn flush_fold(value: &mut String, pending_breaks: &mut Vec<()>, leading_blanks: bool) {
    if !leading_blanks {
        pending_breaks.clear();
        return;
    }
    match pending_breaks.len() {
        0 => {}
        1 => value.push(' '),
        n => {
            for _ in 0..n - 1 {
                value.push('\n');
            }
        }
    }
    pending_breaks.clear();
}

fn render_block_scalar(lines: &[String], folded: bool, chomp: Chomping, trailing_blanks: u32) -> String {
    let content_len = lines.len().saturating_sub(trailing_blanks as usize);
    let mut out = String::new();
    let mut prev_more_indented = false;
    let mut pending_blank_breaks = 0u32;
    let mut first = true;
    for line in &lines[..content_len] {
        if line.is_empty() {
            // A blank paragraph-separator line: defer it, it contributes no
            // text of its own, only a line break once the next content line
            // is known.
            pending_blank_breaks += 1;
            continue;
        }
        let more_indented = line.starts_with(' ');
        if !first {
            if pending_blank_breaks > 0 {
                // One or more blank lines between two content lines is
                // always a literal break, never folded to a space, and the
                // run of b blank lines collapses to b breaks (not b+1):
                // the break that would otherwise separate the two content
                // lines is absorbed into the first blank line.
                for _ in 0..pending_blank_breaks {
                    out.push('\n');
                }
            } else if folded && !more_indented && !prev_more_indented {
                out.push(' ');
            } else {
                out.push('\n');
            }
        }
        out.push_str(line);
        prev_more_indented = more_indented;
        pending_blank_breaks = 0;
        first = false;
    }
    if !lines[..content_len].is_empty() {
        out.push('\n');
    }
    match chomp {
        Chomping::Strip => out.trim_end_matches('\n').to_string(),
        Chomping::Clip => {
            if out.is_empty() {
                out
            } else {
                let trimmed = out.trim_end_matches('\n');
                format!("{trimmed}\n")
            }
        }
        Chomping::Keep => {
            for _ in 0..trailing_blanks {
                out.push('\n');
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;

    fn lex(input: &str) -> Vec<TokenData> {
        let source = SliceSource::new(input.as_bytes()).unwrap();
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let done = matches!(tok.data, TokenData::StreamEnd);
            out.push(tok.data);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn simple_mapping_tokens() {
        let toks = lex("foo: bar\n");
        assert!(matches!(toks[0], TokenData::Indentation { column: 0 }));
        assert!(matches!(&toks[1], TokenData::Scalar { value, .. } if value == "foo"));
        assert!(matches!(toks[2], TokenData::MapValue));
        assert!(matches!(&toks[3], TokenData::Scalar { value, .. } if value == "bar"));
    }

    #[test]
    fn block_sequence_tokens() {
        let toks = lex("- 1\n- 2\n");
        assert!(matches!(toks[0], TokenData::Indentation { column: 0 }));
        assert!(matches!(toks[1], TokenData::SequenceEntry));
        assert!(matches!(&toks[2], TokenData::Scalar { value, .. } if value == "1"));
    }

    #[test]
    fn single_quoted_doubles_apostrophe() {
        let toks = lex("'it''s'\n");
        assert!(matches!(&toks[1], TokenData::Scalar { value, .. } if value == "it's"));
    }

    #[test]
    fn double_quoted_decodes_escapes() {
        let toks = lex("\"a\\tb\\u0041\"\n");
        assert!(matches!(&toks[1], TokenData::Scalar { value, .. } if value == "a\tbA"));
    }

    #[test]
    fn secondary_handle_tag_shorthand() {
        let toks = lex("!!str 42\n");
        assert!(matches!(
            &toks[0],
            TokenData::Tag { handle, suffix, shorthand_end: 2 } if handle == "!!" && suffix == "str"
        ));
    }

    #[test]
    fn named_handle_tag_shorthand() {
        let toks = lex("!e!widget x\n");
        assert!(matches!(
            &toks[0],
            TokenData::Tag { handle, suffix, .. } if handle == "!e!" && suffix == "widget"
        ));
    }

    #[test]
    fn literal_block_scalar_clip_chomp() {
        let toks = lex("|\n  line1\n  line2\n");
        let TokenData::Scalar { value, style } = &toks[1] else {
            panic!("expected scalar, got {:?}", toks[1])
        };
        assert_eq!(style, &ScalarToken::Literal);
        assert_eq!(value, "line1\nline2\n");
    }

    #[test]
    fn folded_block_scalar_strip_chomp() {
        let toks = lex(">-\n  one\n  two\n\n  three\n");
        let TokenData::Scalar { value, .. } = &toks[1] else {
            panic!("expected scalar, got {:?}", toks[1])
        };
        assert_eq!(value, "one two\nthree");
    }

    #[test]
    fn block_scalar_as_mapping_value_ignores_indicator_column() {
        // The `|` sits at column 5 here, well to the right of the key's own
        // column 0; the body's indentation must be measured against the
        // key's line, not the indicator.
        let toks = lex("key: |\n  line1\n  line2\n");
        let scalar = toks
            .iter()
            .filter_map(|t| match t {
                TokenData::Scalar { value, style: ScalarToken::Literal } => Some(value),
                _ => None,
            })
            .next()
            .expect("expected a literal block scalar token");
        assert_eq!(scalar, "line1\nline2\n");
    }

    #[test]
    fn tab_as_indentation_is_an_error() {
        let source = SliceSource::new(b"\tfoo: bar\n").unwrap();
        let mut lexer = Lexer::new(source);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn flow_mapping_tokens() {
        let toks = lex("{a: 1, b: 2}\n");
        assert!(matches!(toks[1], TokenData::FlowMappingStart));
        assert!(matches!(&toks[2], TokenData::Scalar { value, .. } if value == "a"));
        assert!(matches!(toks[4], TokenData::FlowEntry));
    }
}
