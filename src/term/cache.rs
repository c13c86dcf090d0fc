use std::collections::HashMap;

use tracing::debug;

use super::{resolve, TermCode};
use crate::error::Result;

/// Memoizes `resolve` per (term, session) pair for the length of one run.
/// Failures are not cached; the caller aborts on the first one anyway.
#[derive(Debug, Default)]
pub struct CachingResolver {
    cache: HashMap<(String, String), TermCode>,
}

impl CachingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, term: &str, session: &str) -> Result<TermCode> {
        let key = (term.trim().to_string(), session.trim().to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let resolved = resolve(term, session)?;
        debug!(term, session, code = %resolved.code, "resolved term");
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Number of distinct pairs resolved so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
