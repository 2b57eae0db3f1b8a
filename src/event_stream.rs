//! Lazy event iterator with one-element peek and uniform error translation,
//! so a presenter or DOM composer never needs to know whether events came
//! from a live [`Parser`](crate::parser::Parser) or a buffer replay.
//!
//! Generalizes the "absorb everything behind one stable error kind" idea
//! already used by the `LexerError`/`ParserError`/`ConstructionError`
//! wrapping chain to any event producer via a small trait, rather than
//! requiring every caller to match on a concrete parser type.

use crate::error::{ParserError, StreamError};
use crate::event::Event;

/// Anything that can produce a document's worth of events one at a time.
/// Implemented by [`Parser`](crate::parser::Parser); a serializer that
/// manufactures events from native data implements it too.
pub trait EventProducer {
    fn produce(&mut self) -> Result<Option<Event>, ParserError>;
}

impl<S: crate::byte_source::ByteSource> EventProducer for crate::parser::Parser<S> {
    fn produce(&mut self) -> Result<Option<Event>, ParserError> {
        self.next_event()
    }
}

/// Wraps an [`EventProducer`], adding one-element peek and translating every
/// producer error into a single [`StreamError`] kind.
pub struct EventStream<P> {
    producer: P,
    peeked: Option<Event>,
    done: bool,
}

impl<P: EventProducer> EventStream<P> {
    pub fn new(producer: P) -> Self {
        EventStream {
            producer,
            peeked: None,
            done: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Event>, StreamError> {
        self.producer
            .produce()
            .map_err(|e| StreamError::wrap("event producer failed", e))
    }

    /// Returns `true` once the stream is exhausted. Pulls from the producer
    /// if necessary to find out.
    pub fn finished(&mut self) -> Result<bool, StreamError> {
        if self.done {
            return Ok(true);
        }
        if self.peeked.is_some() {
            return Ok(false);
        }
        match self.pull()? {
            Some(ev) => {
                self.peeked = Some(ev);
                Ok(false)
            }
            None => {
                self.done = true;
                Ok(true)
            }
        }
    }

    /// Look at the next event without consuming it. Idempotent: repeated
    /// calls return the same event.
    pub fn peek(&mut self) -> Result<Option<&Event>, StreamError> {
        if self.finished()? {
            return Ok(None);
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume and return the next event. Fails if the stream is already
    /// finished.
    pub fn next(&mut self) -> Result<Event, StreamError> {
        if let Some(ev) = self.peeked.take() {
            return Ok(ev);
        }
        match self.pull()? {
            Some(ev) => Ok(ev),
            None => {
                self.done = true;
                Err(StreamError {
                    message: "next() called on a finished event stream".to_string(),
                    cause: Box::new(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no more events")),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::event::EventData;
    use crate::parser::Parser;

    #[test]
    fn peek_is_idempotent_and_does_not_consume() {
        let parser = Parser::new(SliceSource::new(b"a: 1\n").unwrap());
        let mut stream = EventStream::new(parser);
        let first = stream.peek().unwrap().map(|e| format!("{:?}", e.data));
        let second = stream.peek().unwrap().map(|e| format!("{:?}", e.data));
        assert_eq!(first, second);
        assert!(matches!(stream.next().unwrap().data, EventData::StartDocument));
    }

    #[test]
    fn finished_becomes_true_after_last_event() {
        let parser = Parser::new(SliceSource::new(b"a\n").unwrap());
        let mut stream = EventStream::new(parser);
        let mut count = 0;
        while !stream.finished().unwrap() {
            stream.next().unwrap();
            count += 1;
        }
        assert_eq!(count, 3); // StartDocument, Scalar, EndDocument
    }
}
