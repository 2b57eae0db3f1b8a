//! Tag interning: URI strings in and out of compact [`TagId`]s, plus
//! shorthand (`!!foo`, `!prefix!suffix`) expansion via a configurable
//! secondary prefix and the `%TAG` directive table.
//!
//! Tags flow through the rest of the crate as `Copy` ids rather than cloned
//! `String`s, generalizing the well-known tag constants (`NULL_TAG`,
//! `BOOL_TAG`, ...) and the `%TAG` directive bookkeeping
//! (`tag_directives: Vec<TagDirective>`, the default `!` / `!!` handles)
//! into one interning table that [`Event`](crate::event::Event) can carry
//! a [`TagId`] against instead.

use std::collections::HashMap;

/// An opaque, interned tag identifier. `TagId::NON_SPECIFIC` (`!`) and
/// `TagId::UNRESOLVED` (`?`) are always registered in every library.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TagId(u32);

impl TagId {
    /// The non-specific, explicitly-untyped tag `!`.
    pub const NON_SPECIFIC: TagId = TagId(0);
    /// The non-specific, unresolved tag `?` (the default for untagged
    /// plain/quoted scalars and collections before schema resolution).
    pub const UNRESOLVED: TagId = TagId(1);
}

pub const NULL_TAG: &str = "tag:yaml.org,2002:null";
pub const BOOL_TAG: &str = "tag:yaml.org,2002:bool";
pub const STR_TAG: &str = "tag:yaml.org,2002:str";
pub const INT_TAG: &str = "tag:yaml.org,2002:int";
pub const FLOAT_TAG: &str = "tag:yaml.org,2002:float";
pub const SEQ_TAG: &str = "tag:yaml.org,2002:seq";
pub const MAP_TAG: &str = "tag:yaml.org,2002:map";

pub const OMAP_TAG: &str = "tag:yaml.org,2002:omap";
pub const PAIRS_TAG: &str = "tag:yaml.org,2002:pairs";
pub const SET_TAG: &str = "tag:yaml.org,2002:set";
pub const BINARY_TAG: &str = "tag:yaml.org,2002:binary";
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";
pub const TIMESTAMP_TAG: &str = "tag:yaml.org,2002:timestamp";
pub const VALUE_TAG: &str = "tag:yaml.org,2002:value";
pub const YAML_TAG: &str = "tag:yaml.org,2002:yaml";

pub const DEFAULT_SECONDARY_PREFIX: &str = "tag:yaml.org,2002:";

const CORE_TAGS: &[&str] = &[STR_TAG, SEQ_TAG, MAP_TAG, NULL_TAG, BOOL_TAG, INT_TAG, FLOAT_TAG];
const EXTENDED_TAGS: &[&str] = &[
    OMAP_TAG,
    PAIRS_TAG,
    SET_TAG,
    BINARY_TAG,
    MERGE_TAG,
    TIMESTAMP_TAG,
    VALUE_TAG,
    YAML_TAG,
];

/// Interns tag URIs to [`TagId`]s and resolves `!!`/custom shorthand
/// prefixes. Designed to outlive many parse/present passes — the id table
/// only grows.
pub struct TagLibrary {
    uris: Vec<String>,
    ids: HashMap<String, TagId>,
    secondary_prefix: String,
}

impl TagLibrary {
    fn empty(secondary_prefix: impl Into<String>) -> Self {
        let mut lib = TagLibrary {
            uris: Vec::new(),
            ids: HashMap::new(),
            secondary_prefix: secondary_prefix.into(),
        };
        assert_eq!(lib.register("!"), TagId::NON_SPECIFIC);
        assert_eq!(lib.register("?"), TagId::UNRESOLVED);
        lib
    }

    /// A library with only the ten core-schema tags pre-registered.
    pub fn core() -> Self {
        let mut lib = Self::empty(DEFAULT_SECONDARY_PREFIX);
        for uri in CORE_TAGS {
            lib.register(uri);
        }
        lib
    }

    /// A library with the core tags plus the commonly used extended set
    /// (`!!omap`, `!!pairs`, `!!set`, `!!binary`, `!!merge`, `!!timestamp`,
    /// `!!value`, `!!yaml`).
    pub fn extended() -> Self {
        let mut lib = Self::core();
        for uri in EXTENDED_TAGS {
            lib.register(uri);
        }
        lib
    }

    /// Intern a URI, returning its existing id if already registered.
    /// Idempotent: interning the same URI twice returns the same id.
    pub fn register(&mut self, uri: &str) -> TagId {
        if let Some(&id) = self.ids.get(uri) {
            return id;
        }
        let id = TagId(self.uris.len() as u32);
        self.uris.push(uri.to_string());
        self.ids.insert(uri.to_string(), id);
        id
    }

    /// Look up the URI for an id. Panics if the id was not produced by this
    /// library (ids are not portable across `TagLibrary` instances).
    pub fn uri(&self, id: TagId) -> &str {
        &self.uris[id.0 as usize]
    }

    pub fn secondary_prefix(&self) -> &str {
        &self.secondary_prefix
    }

    pub fn set_secondary_prefix(&mut self, prefix: impl Into<String>) {
        self.secondary_prefix = prefix.into();
    }

    /// Expand a `!handle!suffix` shorthand into a full URI using the
    /// supplied `%TAG` directive table (handle -> prefix), falling back to
    /// the built-in defaults `! -> !` and `!! -> <secondary prefix>`.
    pub fn expand_shorthand(&self, handle: &str, suffix: &str, directives: &[(String, String)]) -> String {
        if let Some((_, prefix)) = directives.iter().find(|(h, _)| h == handle) {
            return format!("{prefix}{suffix}");
        }
        match handle {
            "!!" => format!("{}{}", self.secondary_prefix, suffix),
            "!" => format!("!{suffix}"),
            other => format!("{other}{suffix}"),
        }
    }

    /// Register and intern the full URI for a shorthand tag in one step.
    pub fn register_shorthand(
        &mut self,
        handle: &str,
        suffix: &str,
        directives: &[(String, String)],
    ) -> TagId {
        let uri = self.expand_shorthand(handle, suffix, directives);
        self.register(&uri)
    }
}

impl Default for TagLibrary {
    fn default() -> Self {
        Self::extended()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut lib = TagLibrary::core();
        let a = lib.register("tag:example.com,2024:widget");
        let b = lib.register("tag:example.com,2024:widget");
        assert_eq!(a, b);
        assert_eq!(lib.uri(a), "tag:example.com,2024:widget");
    }

    #[test]
    fn core_tags_preregistered() {
        let mut lib = TagLibrary::core();
        let again = lib.register(STR_TAG);
        assert_eq!(lib.uri(again), STR_TAG);
    }

    #[test]
    fn shorthand_expands_against_default_secondary_prefix() {
        let lib = TagLibrary::core();
        assert_eq!(lib.expand_shorthand("!!", "str", &[]), STR_TAG);
    }

    #[test]
    fn shorthand_expands_against_tag_directive() {
        let lib = TagLibrary::core();
        let directives = vec![("!e!".to_string(), "tag:example.com,2024:".to_string())];
        assert_eq!(
            lib.expand_shorthand("!e!", "widget", &directives),
            "tag:example.com,2024:widget"
        );
    }
}
