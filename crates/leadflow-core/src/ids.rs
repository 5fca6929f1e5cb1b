//! Id allocation.
//!
//! Ids combine a per-generator monotonic sequence with a random suffix,
//! so repeated calls inside the same clock tick never collide.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct IdGenerator {
    seq: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new id such as `job-42-1f3a9c0d`.
    pub fn next(&self, prefix: &str) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let rand = uuid::Uuid::new_v4().simple().to_string();
        format!("{prefix}-{n}-{}", &rand[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_in_tight_loop() {
        let ids = IdGenerator::new();
        let all: HashSet<String> = (0..1000).map(|_| ids.next("job")).collect();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn test_prefix_and_sequence() {
        let ids = IdGenerator::new();
        assert!(ids.next("lead").starts_with("lead-1-"));
        assert!(ids.next("lead").starts_with("lead-2-"));
    }
}
