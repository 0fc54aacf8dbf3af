/// Key-value storage backends for the rule list

use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// Fault reported by a storage backend
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to convert stored value: {0}")]
    Conversion(String),
}

/// Asynchronous, single-namespace key-value store.
///
/// There is no read-modify-write primitive; callers that need one must
/// serialize access themselves.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Value stored under `key`, `None` when nothing was ever written
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-process store. Every call suspends once before completing, like the
/// browser storage it stands in for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Value>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail until switched back off
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make every subsequent `set` fail until switched back off
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Current value without going through the async interface
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        YieldOnce::default().await;
        if self.fail_reads.get() {
            return Err(StoreError::Backend(format!("read of '{}' failed", key)));
        }
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        YieldOnce::default().await;
        if self.fail_writes.get() {
            return Err(StoreError::Backend(format!("write of '{}' failed", key)));
        }
        self.entries.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Returns `Pending` once, then `Ready`
#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
