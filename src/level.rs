//! The parser's explicit ancestry stack: `Level{kind, indentation}` records
//! kept in lockstep with the recursive-descent call stack in `parser.rs`.
//! See `DESIGN.md` for why both exist.

/// Either a known column or "not yet known" (the level was opened by a tag
/// or anchor ahead of the node whose shape determines the real indentation).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Indentation {
    Column(u64),
    Unknown,
}

impl Indentation {
    /// `parent.indentation >= current.indentation`: the comparison §4.4's
    /// level-closing rule is built on. An `Unknown` parent never closes
    /// (it has not committed to a column yet).
    pub fn at_least(self, current: u64) -> bool {
        match self {
            Indentation::Column(col) => col >= current,
            Indentation::Unknown => false,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LevelKind {
    Document,
    Sequence,
    MapKey,
    MapValue,
    SinglePairKey,
    SinglePairValue,
    Scalar,
    /// Opened by a tag/anchor ahead of a node whose kind isn't known yet;
    /// resolved by the bounded `:`-lookahead in `parser.rs`.
    Unknown,
}

#[derive(Copy, Clone, Debug)]
pub struct Level {
    pub kind: LevelKind,
    pub indentation: Indentation,
}

impl Level {
    pub fn new(kind: LevelKind, indentation: Indentation) -> Self {
        Level { kind, indentation }
    }

    /// MapKey -> MapValue, MapValue -> MapKey; any other kind is unaffected.
    pub fn toggle_map_side(&mut self) {
        self.kind = match self.kind {
            LevelKind::MapKey => LevelKind::MapValue,
            LevelKind::MapValue => LevelKind::MapKey,
            LevelKind::SinglePairKey => LevelKind::SinglePairValue,
            LevelKind::SinglePairValue => LevelKind::SinglePairKey,
            other => other,
        };
    }
}

/// The parser's ancestry stack. Always has a `Document` root while a
/// document is open.
#[derive(Debug, Default)]
pub struct Ancestry {
    levels: Vec<Level>,
}

impl Ancestry {
    pub fn new() -> Self {
        Ancestry { levels: Vec::new() }
    }

    pub fn push(&mut self, level: Level) {
        self.levels.push(level);
    }

    pub fn pop(&mut self) -> Option<Level> {
        self.levels.pop()
    }

    pub fn top(&self) -> Option<&Level> {
        self.levels.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Level> {
        self.levels.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Pop every level whose indentation is `>=` `column`, per §4.4's
    /// "close one level, advance the parent's kind" rule. Returns the
    /// popped levels, outermost first, for the caller to turn into `End`
    /// events.
    pub fn close_to(&mut self, column: u64) -> Vec<Level> {
        let mut closed = Vec::new();
        while let Some(top) = self.top() {
            if matches!(top.kind, LevelKind::Document) {
                break;
            }
            if top.indentation.at_least(column) {
                closed.push(self.levels.pop().unwrap());
            } else {
                break;
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_to_pops_deeper_or_equal_levels() {
        let mut stack = Ancestry::new();
        stack.push(Level::new(LevelKind::Document, Indentation::Column(0)));
        stack.push(Level::new(LevelKind::MapKey, Indentation::Column(2)));
        stack.push(Level::new(LevelKind::Sequence, Indentation::Column(4)));

        let closed = stack.close_to(2);
        assert_eq!(closed.len(), 2);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn toggle_map_side_flips_key_and_value() {
        let mut level = Level::new(LevelKind::MapKey, Indentation::Column(0));
        level.toggle_map_side();
        assert_eq!(level.kind, LevelKind::MapValue);
        level.toggle_map_side();
        assert_eq!(level.kind, LevelKind::MapKey);
    }

    #[test]
    fn unknown_parent_never_closes() {
        let indent = Indentation::Unknown;
        assert!(!indent.at_least(0));
        assert!(!indent.at_least(100));
    }
}
