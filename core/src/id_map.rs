//! Bidirectional entity ID registry.
//!
//! RULE: The mapper is mutated only from the driver's tick loop.
//! Each sub-interface owns one mapper for its entity category;
//! external IDs are never shared across categories.
//!
//! Internal IDs allocate from a monotone counter starting at 1 and are
//! never reused, so a stale internal handle can never alias an entity
//! that entered later under the same external ID.

use crate::{
    error::{SimError, SimResult},
    types::{ExternalId, InternalId},
};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct IdMapper {
    by_external:   HashMap<ExternalId, InternalId>,
    by_internal:   HashMap<InternalId, ExternalId>,
    next_internal: InternalId,
}

impl IdMapper {
    pub fn new() -> Self {
        Self {
            by_external:   HashMap::new(),
            by_internal:   HashMap::new(),
            next_internal: 0,
        }
    }

    /// Register an external ID. Idempotent: a second call with the same
    /// external ID returns the existing internal ID.
    pub fn register(&mut self, external: &str) -> InternalId {
        if let Some(&internal) = self.by_external.get(external) {
            return internal;
        }
        self.next_internal += 1;
        let internal = self.next_internal;
        self.by_external.insert(external.to_string(), internal);
        self.by_internal.insert(internal, external.to_string());
        internal
    }

    /// Look up the external ID for an internal ID.
    pub fn resolve(&self, internal: InternalId) -> SimResult<&ExternalId> {
        self.by_internal
            .get(&internal)
            .ok_or_else(|| SimError::NotFound { id: internal.to_string() })
    }

    /// Look up the internal ID for an external ID.
    pub fn resolve_external(&self, external: &str) -> SimResult<InternalId> {
        self.by_external
            .get(external)
            .copied()
            .ok_or_else(|| SimError::NotFound { id: external.to_string() })
    }

    /// Remove a mapping. Returns the internal ID it held, or None if the
    /// external ID was not registered (already-departed entities are a no-op).
    pub fn unregister(&mut self, external: &str) -> Option<InternalId> {
        let internal = self.by_external.remove(external)?;
        self.by_internal.remove(&internal);
        Some(internal)
    }

    pub fn contains_external(&self, external: &str) -> bool {
        self.by_external.contains_key(external)
    }

    pub fn len(&self) -> usize {
        self.by_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_external.is_empty()
    }

    /// Iterate over all registered (external, internal) pairs.
    /// Order is unspecified; sort before using in anything deterministic.
    pub fn iter(&self) -> impl Iterator<Item = (&ExternalId, InternalId)> {
        self.by_external.iter().map(|(e, &i)| (e, i))
    }
}
