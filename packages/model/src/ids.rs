//! Block id generation.
//!
//! Ids are produced through a capability handed to factories and to subtree
//! duplication, so nothing in the model reaches for a global generator.

use crate::BlockId;
use uuid::Uuid;

/// Produces globally unique block ids
pub trait IdGenerator {
    fn next_id(&mut self, block_type: &str) -> BlockId;
}

/// Random ids (`hero-3f2a...`), used in editing sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, block_type: &str) -> BlockId {
        format!("{}-{}", block_type, Uuid::new_v4().simple())
    }
}

/// Deterministic ids (`{prefix}{type}-{n}`), for tests and fixtures
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, block_type: &str) -> BlockId {
        let id = format!("{}{}-{}", self.prefix, block_type, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("t-");
        assert_eq!(ids.next_id("hero"), "t-hero-1");
        assert_eq!(ids.next_id("text"), "t-text-2");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        let a = ids.next_id("hero");
        let b = ids.next_id("hero");
        assert!(a.starts_with("hero-"));
        assert_ne!(a, b);
    }
}
