//! A YAML 1.2 processor: a streaming parser from bytes to a linear event
//! stream, a presenter from events back to text, and an optional DOM layer
//! in between.
//!
//! The pipeline is `ByteSource -> Lexer -> Parser -> EventStream ->
//! (Document or Presenter)`. Each stage is independently usable: a
//! [`Presenter`] can render any [`EventProducer`], not only one backed by
//! this crate's own [`Parser`].

#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::unnecessary_wraps
)]
#![deny(unsafe_code)]

pub mod byte_source;
pub mod dom;
pub mod error;
pub mod event;
pub mod event_stream;
pub mod level;
pub mod lexer;
pub mod parser;
pub mod presenter;
pub mod tag;
pub mod token;
pub mod type_hint;

pub use crate::byte_source::{ByteSource, Encoding, Mark, ReaderSource, SliceSource};
pub use crate::dom::{AnchorStyle as DomAnchorStyle, Document, Node, NodeData, NodeId};
pub use crate::error::{
    ConstructionError, LexerError, ParserError, Positioned, PresenterJsonError, PresenterOutputError, ReaderError,
    StreamError,
};
pub use crate::event::{AnchorId, AnchorTable, Event, EventData, ScalarStyle};
pub use crate::event_stream::{EventProducer, EventStream};
pub use crate::lexer::Lexer;
pub use crate::parser::Parser;
pub use crate::presenter::{
    check_json_representable, AnchorStyle as PresenterAnchorStyle, Newline, OutputVersion, Presenter,
    PresenterOptions, Style,
};
pub use crate::tag::{TagId, TagLibrary};
pub use crate::type_hint::{guess_type, TypeHint};

#[cfg(test)]
mod tests {
    use super::*;

    /// A flat mapping, end to end: bytes in, a full document's worth of
    /// events out.
    #[test]
    fn foo_bar_mapping() {
        let parser = Parser::new(SliceSource::new(b"foo: bar\n").unwrap());
        let mut stream = EventStream::new(parser);
        let mut kinds = Vec::new();
        while !stream.finished().unwrap() {
            kinds.push(format!("{:?}", stream.next().unwrap().data));
        }
        assert_eq!(kinds.len(), 6); // StartDoc, StartMap, 2 scalars, EndMap, EndDoc
        assert!(kinds[0].starts_with("StartDocument"));
        assert!(kinds[1].starts_with("StartMapping"));
        assert!(kinds[4].starts_with("EndMapping"));
        assert!(kinds[5].starts_with("EndDocument"));
    }

    /// Parse, compose to a DOM, serialize, reparse: structure should survive
    /// the round trip even though an anchor, an alias, and a flow collection
    /// are all in play.
    #[test]
    fn dom_round_trip_preserves_structure() {
        let input = "- &a foo\n- *a\n- [1, 2, {x: 1}]\n";

        let parser = Parser::new(SliceSource::new(input.as_bytes()).unwrap());
        let mut stream = EventStream::new(parser);
        let doc = Document::compose(&mut stream).unwrap();

        let events = doc.serialize(DomAnchorStyle::Tidy).unwrap();
        let mut out = Vec::new();
        let mut presenter = Presenter::new(&mut out, PresenterOptions::default());
        presenter.present_document(&events, &TagLibrary::default()).unwrap();
        let rendered = String::from_utf8(out).unwrap();

        let reparsed = Parser::new(SliceSource::new(rendered.as_bytes()).unwrap());
        let mut reparsed_stream = EventStream::new(reparsed);
        let doc2 = Document::compose(&mut reparsed_stream).unwrap();

        let root1 = doc.root().unwrap();
        let root2 = doc2.root().unwrap();
        let NodeData::Sequence { items: items1 } = &doc.node(root1).data else {
            panic!("expected a sequence")
        };
        let NodeData::Sequence { items: items2 } = &doc2.node(root2).data else {
            panic!("expected a sequence")
        };
        assert_eq!(items1.len(), items2.len());
    }
}
