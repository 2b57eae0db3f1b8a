//! A materialized node graph (the "DOM" layer): compose one from an event
//! stream, or serialize one back into events.
//!
//! `Document`/`Node`/`NodeData` sit in a flat `Vec<Node>` arena addressed by
//! index rather than `Rc`/`Weak` pointers; `load_node` carries an anchor
//! table alongside the arena to attach a freshly loaded node to its parent
//! and to resolve aliases as they're encountered. Serializing back out runs
//! a ref-counting anchor pass first (see `compute_refs`): the same "anchor a
//! node the second time anything points at it" rule, but recursing to full
//! depth on first visit rather than stopping one level down, so sharing
//! detected anywhere in the graph gets an anchor, not only sharing among a
//! parent's immediate children (see `DESIGN.md`).

use std::collections::{HashMap, HashSet};

use crate::byte_source::Mark;
use crate::error::ConstructionError;
use crate::event::{AnchorId, AnchorTable, Event, EventData, ScalarStyle};
use crate::event_stream::{EventProducer, EventStream};
use crate::tag::TagId;

/// An index into a [`Document`]'s node arena. `0` never denotes a real node;
/// [`Document::add_scalar`] and friends start numbering at `1`, so a
/// default-initialized id is never mistaken for a real one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    pub tag: TagId,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

#[derive(Clone, Debug)]
pub enum NodeData {
    Scalar { value: String, style: Option<ScalarStyle> },
    Sequence { items: Vec<NodeId> },
    Mapping { pairs: Vec<(NodeId, NodeId)> },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AnchorStyle {
    /// Never emit anchors; an error if the graph has any shared node.
    None,
    /// Emit an anchor only on nodes referenced from more than one place.
    Tidy,
    /// Emit an anchor on every node, shared or not.
    Always,
}

#[derive(Default)]
pub struct Document {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    pub version_directive: Option<(u32, u32)>,
    pub tag_directives: Vec<(String, String)>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize - 1]
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() as u32)
    }

    pub fn add_scalar(&mut self, tag: TagId, value: impl Into<String>, style: Option<ScalarStyle>) -> NodeId {
        self.push_node(Node {
            data: NodeData::Scalar { value: value.into(), style },
            tag,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        })
    }

    pub fn add_sequence(&mut self, tag: TagId) -> NodeId {
        self.push_node(Node {
            data: NodeData::Sequence { items: Vec::new() },
            tag,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        })
    }

    pub fn add_mapping(&mut self, tag: TagId) -> NodeId {
        self.push_node(Node {
            data: NodeData::Mapping { pairs: Vec::new() },
            tag,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        })
    }

    pub fn push_sequence_item(&mut self, sequence: NodeId, item: NodeId) {
        match &mut self.nodes[sequence.0 as usize - 1].data {
            NodeData::Sequence { items } => items.push(item),
            _ => panic!("push_sequence_item called on a non-sequence node"),
        }
    }

    pub fn push_mapping_pair(&mut self, mapping: NodeId, key: NodeId, value: NodeId) {
        match &mut self.nodes[mapping.0 as usize - 1].data {
            NodeData::Mapping { pairs } => pairs.push((key, value)),
            _ => panic!("push_mapping_pair called on a non-mapping node"),
        }
    }

    /// Build a `Document` by draining one document's worth of events (up to
    /// and including `EndDocument`) from `stream`.
    pub fn compose<P: EventProducer>(stream: &mut EventStream<P>) -> Result<Document, ConstructionError> {
        let mut doc = Document::new();
        match stream.next()? {
            Event { data: EventData::StartDocument, .. } => {}
            other => {
                return Err(ConstructionError::Message(format!(
                    "expected a document start event, found {:?}",
                    other.data
                )))
            }
        }
        let mut anchors: HashMap<AnchorId, NodeId> = HashMap::new();
        if !matches!(stream.peek()?.map(|e| &e.data), Some(EventData::EndDocument)) {
            let root = doc.load_node(stream, &mut anchors)?;
            doc.set_root(root);
        }
        match stream.next()? {
            Event { data: EventData::EndDocument, .. } => {}
            other => {
                return Err(ConstructionError::Message(format!(
                    "expected a document end event, found {:?}",
                    other.data
                )))
            }
        }
        Ok(doc)
    }

    /// Read one node's worth of events (a scalar, an alias, or a
    /// start/…/end-delimited container) and add it to this document's arena.
    /// Children are composed and pushed before their parent returns, so
    /// `doc.nodes` always holds a node after all of its descendants.
    fn load_node<P: EventProducer>(
        &mut self,
        stream: &mut EventStream<P>,
        anchors: &mut HashMap<AnchorId, NodeId>,
    ) -> Result<NodeId, ConstructionError> {
        let ev = stream.next()?;
        match ev.data {
            EventData::Scalar { tag, anchor, content, style } => {
                let id = self.push_node(Node {
                    data: NodeData::Scalar { value: content, style },
                    tag,
                    start_mark: ev.start_mark,
                    end_mark: ev.end_mark,
                });
                if !anchor.is_none() {
                    anchors.insert(anchor, id);
                }
                Ok(id)
            }
            EventData::Alias { target } => anchors.get(&target).copied().ok_or_else(|| {
                ConstructionError::Message("alias target anchor was not composed before the alias".to_string())
            }),
            EventData::StartSequence { tag, anchor } => {
                let id = self.push_node(Node {
                    data: NodeData::Sequence { items: Vec::new() },
                    tag,
                    start_mark: ev.start_mark,
                    end_mark: ev.start_mark,
                });
                if !anchor.is_none() {
                    anchors.insert(anchor, id);
                }
                loop {
                    if matches!(stream.peek()?.map(|e| &e.data), Some(EventData::EndSequence)) {
                        let end = stream.next()?;
                        self.nodes[id.0 as usize - 1].end_mark = end.end_mark;
                        break;
                    }
                    let item = self.load_node(stream, anchors)?;
                    self.push_sequence_item(id, item);
                }
                Ok(id)
            }
            EventData::StartMapping { tag, anchor } => {
                let id = self.push_node(Node {
                    data: NodeData::Mapping { pairs: Vec::new() },
                    tag,
                    start_mark: ev.start_mark,
                    end_mark: ev.start_mark,
                });
                if !anchor.is_none() {
                    anchors.insert(anchor, id);
                }
                loop {
                    if matches!(stream.peek()?.map(|e| &e.data), Some(EventData::EndMapping)) {
                        let end = stream.next()?;
                        self.nodes[id.0 as usize - 1].end_mark = end.end_mark;
                        break;
                    }
                    let key = self.load_node(stream, anchors)?;
                    let value = self.load_node(stream, anchors)?;
                    self.push_mapping_pair(id, key, value);
                }
                Ok(id)
            }
            other => Err(ConstructionError::Message(format!(
                "unexpected event while composing a node: {other:?}"
            ))),
        }
    }

    fn compute_refs(&self, id: NodeId, refs: &mut HashMap<NodeId, u32>) {
        let count = refs.entry(id).or_insert(0);
        *count += 1;
        if *count > 1 {
            return;
        }
        match &self.node(id).data {
            NodeData::Sequence { items } => {
                for &item in items {
                    self.compute_refs(item, refs);
                }
            }
            NodeData::Mapping { pairs } => {
                for &(k, v) in pairs {
                    self.compute_refs(k, refs);
                    self.compute_refs(v, refs);
                }
            }
            NodeData::Scalar { .. } => {}
        }
    }

    /// Flatten this document back into an event sequence, assigning fresh
    /// anchors per `anchor_style`.
    pub fn serialize(&self, anchor_style: AnchorStyle) -> Result<Vec<Event>, ConstructionError> {
        let mut refs = HashMap::new();
        if let Some(root) = self.root {
            self.compute_refs(root, &mut refs);
        }

        if matches!(anchor_style, AnchorStyle::None) && refs.values().any(|&c| c >= 2) {
            return Err(ConstructionError::Message(
                "anchor_style is None but the document graph shares a node between two parents".to_string(),
            ));
        }

        let mut anchor_table = AnchorTable::new();
        let mut anchor_ids: HashMap<NodeId, AnchorId> = HashMap::new();
        for (&id, &count) in &refs {
            if count >= 2 || matches!(anchor_style, AnchorStyle::Always) {
                anchor_ids.insert(id, anchor_table.allocate());
            }
        }

        let mut events = vec![Event::start_document(Mark::default())];
        let mut emitted: HashSet<NodeId> = HashSet::new();
        if let Some(root) = self.root {
            self.serialize_node(root, &anchor_ids, &mut emitted, &mut events)?;
        }
        events.push(Event::end_document(Mark::default()));
        Ok(events)
    }

    fn serialize_node(
        &self,
        id: NodeId,
        anchor_ids: &HashMap<NodeId, AnchorId>,
        emitted: &mut HashSet<NodeId>,
        events: &mut Vec<Event>,
    ) -> Result<(), ConstructionError> {
        let node = self.node(id);
        if emitted.contains(&id) {
            let target = anchor_ids.get(&id).copied().ok_or_else(|| {
                ConstructionError::Message("a shared node has no anchor assigned for aliasing".to_string())
            })?;
            events.push(Event {
                data: EventData::Alias { target },
                start_mark: node.start_mark,
                end_mark: node.end_mark,
            });
            return Ok(());
        }
        emitted.insert(id);
        let anchor = anchor_ids.get(&id).copied().unwrap_or(AnchorId::NONE);

        match &node.data {
            NodeData::Scalar { value, style } => {
                events.push(Event {
                    data: EventData::Scalar {
                        tag: node.tag,
                        anchor,
                        content: value.clone(),
                        style: *style,
                    },
                    start_mark: node.start_mark,
                    end_mark: node.end_mark,
                });
            }
            NodeData::Sequence { items } => {
                let items = items.clone();
                events.push(Event {
                    data: EventData::StartSequence { tag: node.tag, anchor },
                    start_mark: node.start_mark,
                    end_mark: node.end_mark,
                });
                for item in items {
                    self.serialize_node(item, anchor_ids, emitted, events)?;
                }
                events.push(Event {
                    data: EventData::EndSequence,
                    start_mark: node.end_mark,
                    end_mark: node.end_mark,
                });
            }
            NodeData::Mapping { pairs } => {
                let pairs = pairs.clone();
                events.push(Event {
                    data: EventData::StartMapping { tag: node.tag, anchor },
                    start_mark: node.start_mark,
                    end_mark: node.end_mark,
                });
                for (k, v) in pairs {
                    self.serialize_node(k, anchor_ids, emitted, events)?;
                    self.serialize_node(v, anchor_ids, emitted, events)?;
                }
                events.push(Event {
                    data: EventData::EndMapping,
                    start_mark: node.end_mark,
                    end_mark: node.end_mark,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::event_stream::EventStream;
    use crate::parser::Parser;
    use crate::tag::TagId;

    fn compose(input: &str) -> Document {
        let parser = Parser::new(SliceSource::new(input.as_bytes()).unwrap());
        let mut stream = EventStream::new(parser);
        Document::compose(&mut stream).unwrap()
    }

    #[test]
    fn composes_a_flat_mapping() {
        let doc = compose("foo: bar\nbaz: qux\n");
        let root = doc.root().unwrap();
        let NodeData::Mapping { pairs } = &doc.node(root).data else {
            panic!("expected a mapping")
        };
        assert_eq!(pairs.len(), 2);
        let NodeData::Scalar { value, .. } = &doc.node(pairs[0].0).data else {
            panic!("expected a scalar key")
        };
        assert_eq!(value, "foo");
    }

    #[test]
    fn alias_resolves_to_the_already_composed_node() {
        let doc = compose("- &a foo\n- *a\n");
        let root = doc.root().unwrap();
        let NodeData::Sequence { items } = &doc.node(root).data else {
            panic!("expected a sequence")
        };
        assert_eq!(items[0], items[1]);
    }

    #[test]
    fn serialize_round_trips_a_shared_node_as_an_alias() {
        let mut doc = Document::new();
        let shared = doc.add_scalar(TagId::UNRESOLVED, "shared", None);
        let seq = doc.add_sequence(TagId::UNRESOLVED);
        doc.push_sequence_item(seq, shared);
        doc.push_sequence_item(seq, shared);
        doc.set_root(seq);

        let events = doc.serialize(AnchorStyle::Tidy).unwrap();
        let aliases = events.iter().filter(|e| matches!(e.data, EventData::Alias { .. })).count();
        assert_eq!(aliases, 1);
    }

    #[test]
    fn none_anchor_style_rejects_a_shared_graph() {
        let mut doc = Document::new();
        let shared = doc.add_scalar(TagId::UNRESOLVED, "shared", None);
        let seq = doc.add_sequence(TagId::UNRESOLVED);
        doc.push_sequence_item(seq, shared);
        doc.push_sequence_item(seq, shared);
        doc.set_root(seq);

        assert!(doc.serialize(AnchorStyle::None).is_err());
    }
}
