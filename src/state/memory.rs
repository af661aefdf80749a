//! Volatile state store.

use std::cell::RefCell;
use std::rc::Rc;

use super::{SolarConfig, StateStore};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    saved: Option<SolarConfig>,
    failing: bool,
    writes: usize,
}

/// In-memory [`StateStore`].
///
/// Clones share the same record, so a test can keep a handle to inspect what
/// the scheduler wrote or to make the next writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `config`.
    pub fn with_saved(config: SolarConfig) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().saved = Some(config);
        store
    }

    /// Make every subsequent `store` call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.borrow_mut().failing = failing;
    }

    /// The last acknowledged snapshot.
    pub fn saved(&self) -> Option<SolarConfig> {
        self.inner.borrow().saved
    }

    /// Number of acknowledged writes.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl StateStore for MemoryStore {
    fn retrieve(&self, default: SolarConfig) -> Result<SolarConfig, StoreError> {
        Ok(self.inner.borrow().saved.unwrap_or(default))
    }

    fn store(&mut self, config: &SolarConfig) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing {
            return Err(StoreError::Rejected("store is read-only".to_string()));
        }
        inner.saved = Some(*config);
        inner.writes += 1;
        Ok(())
    }
}
