//! Key-to-aspect mapping.
//!
//! `AspectMap` is the static table that gives raw attribute keys a meaning:
//! which named aspects of an entity a key affects, and which keys of an
//! observed entity a related entity's key stands for. It is built once and
//! shared read-only (`Arc<AspectMap>`).
//!
//! # Example
//!
//! ```
//! use ripple_core::EntityKind;
//! use ripple_reactive::{AspectMap, RelationSpec};
//!
//! const CONVERSATION: EntityKind = EntityKind::new("conversation");
//! const USER: EntityKind = EntityKind::new("user");
//!
//! let map = AspectMap::builder()
//!     .aspects(CONVERSATION, "displayName", ["nameChanged"])
//!     .aspects(CONVERSATION, "otherActiveParticipants", ["participantsChanged"])
//!     .relation(
//!         RelationSpec::new("participant", CONVERSATION, USER)
//!             .membership_keys(["otherActiveParticipants", "displayName"])
//!             .translate("name", ["displayName"]),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(map.aspects_for(CONVERSATION, "displayName").contains("nameChanged"));
//! assert!(map.translate("participant", "name").contains("displayName"));
//! assert!(map.aspects_for(CONVERSATION, "unknown").is_empty());
//! ```

use hashbrown::HashMap;
use ripple_core::{AspectSet, EntityKind, Error, KeySet, Result};

/// How a relation between two kinds of entity feeds the observed side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationSpec {
    name: String,
    observed: EntityKind,
    related: EntityKind,
    membership_keys: KeySet,
    translations: HashMap<String, KeySet>,
}

impl RelationSpec {
    /// Creates a relation from `observed` entities to `related` entities.
    pub fn new(name: impl Into<String>, observed: EntityKind, related: EntityKind) -> Self {
        Self {
            name: name.into(),
            observed,
            related,
            membership_keys: KeySet::new(),
            translations: HashMap::new(),
        }
    }

    /// Keys of the observed entity reported when an edge of this relation is
    /// added or removed.
    pub fn membership_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.membership_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Maps a raw key of the related entity to keys of the observed entity.
    pub fn translate<I, K>(mut self, related_key: impl Into<String>, observed_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.translations
            .entry(related_key.into())
            .or_default()
            .extend(observed_keys.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn observed_kind(&self) -> EntityKind {
        self.observed
    }

    #[inline]
    pub fn related_kind(&self) -> EntityKind {
        self.related
    }

    #[inline]
    pub fn membership(&self) -> &KeySet {
        &self.membership_keys
    }

    /// Observed keys implied by a related key, if it is mapped.
    #[inline]
    pub fn translation(&self, related_key: &str) -> Option<&KeySet> {
        self.translations.get(related_key)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_mapping("relation name is empty"));
        }
        let empty_key = self
            .membership_keys
            .iter()
            .chain(self.translations.keys())
            .chain(self.translations.values().flatten())
            .any(|k| k.is_empty());
        if empty_key {
            return Err(Error::invalid_mapping(format!(
                "relation {} maps an empty key",
                self.name
            )));
        }
        Ok(())
    }
}

/// Static mapping from raw keys to aspects, for own and related entities.
#[derive(Clone, Debug, Default)]
pub struct AspectMap {
    aspects: HashMap<EntityKind, HashMap<String, AspectSet>>,
    relations: HashMap<String, RelationSpec>,
}

impl AspectMap {
    /// Starts building a map.
    pub fn builder() -> AspectMapBuilder {
        AspectMapBuilder::default()
    }

    /// Aspects of a `kind` entity affected by a change of `key`.
    ///
    /// Unknown keys map to the empty set so that attributes the table does not
    /// model yet are simply not reported.
    pub fn aspects_for(&self, kind: EntityKind, key: &str) -> AspectSet {
        self.aspects
            .get(&kind)
            .and_then(|keys| keys.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Keys of the observed entity implied by a change of `related_key` on the
    /// other end of `relation`.
    pub fn translate(&self, relation: &str, related_key: &str) -> KeySet {
        self.relations
            .get(relation)
            .and_then(|spec| spec.translation(related_key))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the relation registered under `name`.
    #[inline]
    pub fn relation(&self, name: &str) -> Option<&RelationSpec> {
        self.relations.get(name)
    }

    /// Keys reported on the observed entity when a `relation` edge changes.
    pub fn membership_keys(&self, relation: &str) -> KeySet {
        self.relations
            .get(relation)
            .map(|spec| spec.membership().clone())
            .unwrap_or_default()
    }

    /// Every aspect the table knows for `kind`.
    pub fn all_aspects(&self, kind: EntityKind) -> AspectSet {
        self.aspects
            .get(&kind)
            .map(|keys| keys.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Every key the table maps for `kind`.
    pub fn all_keys(&self, kind: EntityKind) -> KeySet {
        self.aspects
            .get(&kind)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of relations.
    #[inline]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

/// Builder for `AspectMap`.
#[derive(Debug, Default)]
pub struct AspectMapBuilder {
    map: AspectMap,
    relations: Vec<RelationSpec>,
    errors: Vec<Error>,
}

impl AspectMapBuilder {
    /// Declares that a change of `key` on a `kind` entity affects `aspects`.
    pub fn aspects<I, A>(mut self, kind: EntityKind, key: impl Into<String>, aspects: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let key = key.into();
        let aspects: AspectSet = aspects.into_iter().map(Into::into).collect();
        if key.is_empty() || aspects.iter().any(|a| a.is_empty()) {
            self.errors.push(Error::invalid_mapping(format!(
                "empty key or aspect for {}",
                kind
            )));
            return self;
        }
        self.map
            .aspects
            .entry(kind)
            .or_default()
            .entry(key)
            .or_default()
            .extend(aspects);
        self
    }

    /// Registers a relation.
    pub fn relation(mut self, spec: RelationSpec) -> Self {
        self.relations.push(spec);
        self
    }

    /// Validates the table and freezes it.
    pub fn build(mut self) -> Result<AspectMap> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        for spec in self.relations {
            spec.validate()?;
            if self.map.relations.contains_key(spec.name()) {
                return Err(Error::duplicate_relation(spec.name()));
            }
            self.map.relations.insert(spec.name().to_string(), spec);
        }
        Ok(self.map)
    }
}
