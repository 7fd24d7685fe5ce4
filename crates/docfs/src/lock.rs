use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// Requested access to a named resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

#[derive(Default)]
struct ResourceState {
    readers: usize,
    writer: bool,
}

impl ResourceState {
    fn grantable(&self, mode: LockMode) -> bool {
        match mode {
            LockMode::Read => !self.writer,
            LockMode::Write => !self.writer && self.readers == 0,
        }
    }

    fn is_idle(&self) -> bool {
        !self.writer && self.readers == 0
    }
}

struct Inner {
    state: Mutex<HashMap<String, ResourceState>>,
    notify: Notify,
}

/// Grants read/write locks over named resources as atomic sets.
///
/// One table serves every filesystem instance opened against the same
/// store name, so separately constructed handles serialize against each
/// other. Critical sections never await while holding the state mutex;
/// waiting happens on the [`Notify`] instead.
#[derive(Clone)]
pub struct LockTable {
    inner: Arc<Inner>,
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            inner: Arc::new(Inner {
                state: Mutex::new(HashMap::new()),
                notify: Notify::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HashMap<String, ResourceState>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend until every requested resource is grantable, then take them
    /// all at once. The returned guard releases them when dropped, so the
    /// failure path of a protected section releases exactly like the
    /// success path.
    pub async fn wait(&self, requests: &[(String, LockMode)]) -> LockSet {
        loop {
            // Register interest before inspecting state so a release that
            // lands in between still wakes us.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state();
                let all_free = requests.iter().all(|(name, mode)| {
                    state.get(name).is_none_or(|r| r.grantable(*mode))
                });
                if all_free {
                    for (name, mode) in requests {
                        let resource = state.entry(name.clone()).or_default();
                        match mode {
                            LockMode::Read => resource.readers += 1,
                            LockMode::Write => resource.writer = true,
                        }
                    }
                    return LockSet {
                        table: self.clone(),
                        held: requests.to_vec(),
                    };
                }
            }

            notified.await;
        }
    }

    /// Diagnostic: how many of the requested (resource, mode) pairs are
    /// currently held by someone.
    pub fn test_locks(&self, requests: &[(String, LockMode)]) -> usize {
        let state = self.state();
        requests
            .iter()
            .filter(|(name, mode)| {
                state.get(name).is_some_and(|r| match mode {
                    LockMode::Read => r.readers > 0,
                    LockMode::Write => r.writer,
                })
            })
            .count()
    }

    fn release(&self, held: &[(String, LockMode)]) {
        {
            let mut state = self.state();
            for (name, mode) in held {
                if let Some(resource) = state.get_mut(name) {
                    match mode {
                        LockMode::Read => resource.readers = resource.readers.saturating_sub(1),
                        LockMode::Write => resource.writer = false,
                    }
                    if resource.is_idle() {
                        state.remove(name);
                    }
                }
            }
        }
        self.inner.notify.notify_waiters();
    }
}

impl std::fmt::Debug for LockTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LockTable{{}}")
    }
}

/// Release capability for one granted set of resources.
pub struct LockSet {
    table: LockTable,
    held: Vec<(String, LockMode)>,
}

impl Drop for LockSet {
    fn drop(&mut self) {
        self.table.release(&self.held);
    }
}

/// Convenience for the common single-resource write lock.
pub(crate) fn write_lock(resource: &str) -> Vec<(String, LockMode)> {
    vec![(resource.to_string(), LockMode::Write)]
}
