//! Bounded in-process buffer kept in front of the shared store.
//!
//! Insertion-ordered: once full, the oldest entry is evicted. Entries carry
//! the same TTL they were written with.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Slot {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    order: VecDeque<String>,
}

impl Inner {
    fn forget(&mut self, key: &str) -> bool {
        if self.slots.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
pub struct BoundedCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl BoundedCache {
    /// A capacity of zero disables the buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        let now = Instant::now();
        let expired = match inner.slots.get(key) {
            Some(slot) if now < slot.expires_at => return Some(slot.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.forget(key);
        }
        None
    }

    pub fn insert(&self, key: &str, value: String, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.lock();
        inner.forget(key);
        while inner.slots.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.slots.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.to_string());
        inner.slots.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().forget(key)
    }

    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.slots.len();
        inner.slots.retain(|k, _| !k.starts_with(prefix));
        inner.order.retain(|k| !k.starts_with(prefix));
        before - inner.slots.len()
    }

    pub fn purge_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let before = inner.slots.len();
        inner.slots.retain(|_, slot| now < slot.expires_at);
        let Inner { slots, order } = &mut *inner;
        order.retain(|k| slots.contains_key(k));
        before - slots.len()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.slots.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock only means another thread panicked mid-update; the
    // map is still structurally valid.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn oldest_entry_evicted_on_overflow() {
        let l1 = BoundedCache::new(2);
        l1.insert("a", "1".into(), TTL);
        l1.insert("b", "2".into(), TTL);
        l1.insert("c", "3".into(), TTL);

        assert_eq!(l1.len(), 2);
        assert!(l1.get("a").is_none());
        assert_eq!(l1.get("b").as_deref(), Some("2"));
        assert_eq!(l1.get("c").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn rewriting_a_key_refreshes_its_position() {
        let l1 = BoundedCache::new(2);
        l1.insert("a", "1".into(), TTL);
        l1.insert("b", "2".into(), TTL);
        l1.insert("a", "1b".into(), TTL);
        l1.insert("c", "3".into(), TTL);

        assert!(l1.get("b").is_none());
        assert_eq!(l1.get("a").as_deref(), Some("1b"));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_honour_ttl() {
        let l1 = BoundedCache::new(4);
        l1.insert("a", "1".into(), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(l1.get("a").is_none());
        assert!(l1.is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_disables_buffer() {
        let l1 = BoundedCache::new(0);
        l1.insert("a", "1".into(), TTL);
        assert!(l1.get("a").is_none());
    }

    #[tokio::test]
    async fn prefix_removal() {
        let l1 = BoundedCache::new(8);
        l1.insert("beats:list:x", "1".into(), TTL);
        l1.insert("beats:detail:1", "2".into(), TTL);
        l1.insert("content:faq", "3".into(), TTL);
        assert_eq!(l1.remove_prefix("beats:"), 2);
        assert_eq!(l1.len(), 1);
    }
}
