//! Process-wide deduplication windows used by `toUnique`.
//!
//! Each kind name owns a fixed-capacity FIFO of recently admitted keys plus a
//! membership set. It is a recency window, not a full history: once a key has
//! been evicted it is admitted again.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub struct DedupWindow {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl DedupWindow {
    pub fn new(capacity: usize) -> Self {
        DedupWindow {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    /// Admits `key` unless it is already in the window. A full window evicts
    /// its oldest key first. Returns whether the key was admitted.
    pub fn admit(&mut self, key: String) -> bool {
        if self.members.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(key.clone());
        self.order.push_back(key);
        true
    }
}

type Windows = Mutex<HashMap<String, Arc<Mutex<DedupWindow>>>>;

fn windows() -> &'static Windows {
    static WINDOWS: OnceLock<Windows> = OnceLock::new();
    WINDOWS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The window for `kind`, created with `capacity` on first use. Later
/// capacities for an existing kind are ignored.
pub fn window(kind: &str, capacity: usize) -> Arc<Mutex<DedupWindow>> {
    let mut windows = windows().lock();
    let window = windows.entry(kind.to_string()).or_insert_with(|| {
        tracing::debug!(kind, capacity, "dedup window created");
        Arc::new(Mutex::new(DedupWindow::new(capacity)))
    });
    Arc::clone(window)
}

/// Drops the window for `kind`; the next use starts empty.
pub fn forget(kind: &str) -> bool {
    windows().lock().remove(kind).is_some()
}
