use dashmap::DashMap;
use std::hash::Hash;
use std::time::Instant;

// Failure bookkeeping for a single principal
#[derive(Debug, Clone)]
pub(crate) struct AttemptRecord {
    pub failure_count: u32,
    pub blocked_until: Option<Instant>,
    pub last_failure_at: Instant,
}

impl AttemptRecord {
    fn new(now: Instant) -> Self {
        Self {
            failure_count: 0,
            blocked_until: None,
            last_failure_at: now,
        }
    }

    pub fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    // lockout has run out - logically clean, just not evicted yet
    pub fn is_expired(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| until <= now)
    }
}

/// Concurrent principal -> record table.
///
/// Every read-modify-write goes through the DashMap entry API, so it runs
/// under the write lock of the shard that owns the key. Unrelated principals
/// on other shards are not serialized against each other.
pub(crate) struct AttemptStore<P> {
    records: DashMap<P, AttemptRecord>,
    max_tracked: Option<usize>,
}

impl<P> AttemptStore<P>
where
    P: Eq + Hash + Clone,
{
    pub fn new(max_tracked: Option<usize>) -> Self {
        Self {
            records: DashMap::new(),
            max_tracked,
        }
    }

    pub fn inspect<R>(&self, principal: &P, f: impl FnOnce(&AttemptRecord) -> R) -> Option<R> {
        self.records.get(principal).map(|record| f(record.value()))
    }

    // Atomically drop the record if its lockout has passed
    pub fn evict_if_expired(&self, principal: &P, now: Instant) -> bool {
        self.records
            .remove_if(principal, |_, record| record.is_expired(now))
            .is_some()
    }

    /// Run `f` against the principal's record while holding its entry lock.
    ///
    /// Absent records are created clean; records whose lockout already ran
    /// out are reset to clean before `f` sees them.
    ///
    /// With `max_tracked` set the table is trimmed back below the limit before
    /// a new principal goes in. The check and the insert are separate steps,
    /// so racing inserts of new principals can overshoot the limit briefly;
    /// the next insert trims it back.
    pub fn update<R>(
        &self,
        principal: P,
        now: Instant,
        f: impl FnOnce(&mut AttemptRecord) -> R,
    ) -> R {
        if let Some(limit) = self.max_tracked {
            if !self.records.contains_key(&principal) {
                self.make_room(now, limit);
            }
        }

        let mut entry = self
            .records
            .entry(principal)
            .or_insert_with(|| AttemptRecord::new(now));
        let record = entry.value_mut();
        if record.is_expired(now) {
            *record = AttemptRecord::new(now);
        }
        f(record)
    }

    pub fn remove(&self, principal: &P) -> bool {
        self.records.remove(principal).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut purged = 0;
        self.records.retain(|_, record| {
            let keep = !record.is_expired(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    // Bounded-table path: expired lockouts go first, then the principals
    // whose last failure is oldest. O(n), only reached when max_tracked is set.
    fn make_room(&self, now: Instant, limit: usize) {
        if self.records.len() < limit {
            return;
        }
        let purged = self.purge_expired(now);
        if purged > 0 {
            tracing::debug!(purged, "attempt table full, purged expired lockouts");
        }

        let mut evicted = 0;
        while self.records.len() >= limit {
            let oldest = self
                .records
                .iter()
                .min_by_key(|entry| entry.value().last_failure_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.records.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        if evicted > 0 {
            tracing::warn!(
                limit,
                evicted,
                "attempt table full, evicted least recently failing principals"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fail(store: &AttemptStore<&'static str>, key: &'static str, now: Instant) {
        store.update(key, now, |record| {
            record.failure_count += 1;
            record.last_failure_at = now;
        });
    }

    #[test]
    fn update_creates_record_lazily() {
        let store = AttemptStore::new(None);
        let now = Instant::now();
        assert_eq!(store.len(), 0);
        assert!(store.inspect(&"a", |r| r.failure_count).is_none());

        fail(&store, "a", now);
        assert_eq!(store.len(), 1);
        assert_eq!(store.inspect(&"a", |r| r.failure_count), Some(1));
    }

    #[test]
    fn expired_record_is_reset_before_update() {
        let store = AttemptStore::new(None);
        let now = Instant::now();
        store.update("a", now, |record| {
            record.failure_count = 5;
            record.blocked_until = Some(now + Duration::from_secs(10));
        });

        let later = now + Duration::from_secs(10);
        let count = store.update("a", later, |record| record.failure_count);
        assert_eq!(count, 0);
        assert_eq!(store.inspect(&"a", |r| r.blocked_until), Some(None));
    }

    #[test]
    fn evict_only_touches_expired_records() {
        let store = AttemptStore::new(None);
        let now = Instant::now();
        fail(&store, "warned", now);
        store.update("blocked", now, |record| {
            record.blocked_until = Some(now + Duration::from_secs(5));
        });

        assert!(!store.evict_if_expired(&"warned", now));
        assert!(!store.evict_if_expired(&"blocked", now));
        assert!(store.evict_if_expired(&"blocked", now + Duration::from_secs(5)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn purge_counts_removed_records() {
        let store = AttemptStore::new(None);
        let now = Instant::now();
        for key in ["a", "b", "c"] {
            store.update(key, now, |record| {
                record.blocked_until = Some(now + Duration::from_secs(1));
            });
        }
        fail(&store, "d", now);

        assert_eq!(store.purge_expired(now), 0);
        assert_eq!(store.purge_expired(now + Duration::from_secs(1)), 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn bounded_store_purges_expired_before_evicting() {
        let store = AttemptStore::new(Some(2));
        let now = Instant::now();
        store.update("expiring", now, |record| {
            record.blocked_until = Some(now + Duration::from_secs(1));
        });
        fail(&store, "warned", now);

        let later = now + Duration::from_secs(2);
        fail(&store, "newcomer", later);

        assert_eq!(store.len(), 2);
        assert!(store.inspect(&"expiring", |_| ()).is_none());
        assert_eq!(store.inspect(&"warned", |r| r.failure_count), Some(1));
    }

    #[test]
    fn bounded_store_evicts_least_recent_failure() {
        let store = AttemptStore::new(Some(2));
        let now = Instant::now();
        fail(&store, "old", now);
        fail(&store, "recent", now + Duration::from_secs(1));
        fail(&store, "newcomer", now + Duration::from_secs(2));

        assert_eq!(store.len(), 2);
        assert!(store.inspect(&"old", |_| ()).is_none());
        assert!(store.inspect(&"recent", |_| ()).is_some());

        // existing keys never trigger eviction
        fail(&store, "recent", now + Duration::from_secs(3));
        assert_eq!(store.len(), 2);
        assert!(store.inspect(&"newcomer", |_| ()).is_some());
    }

    #[test]
    fn overfull_store_is_trimmed_back_under_limit() {
        let store = AttemptStore::new(Some(2));
        let now = Instant::now();
        // as if racing inserts had slipped past the limit
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            let at = now + Duration::from_secs(i as u64);
            store.records.insert(key, AttemptRecord::new(at));
        }

        fail(&store, "newcomer", now + Duration::from_secs(10));

        assert_eq!(store.len(), 2);
        assert!(store.inspect(&"d", |_| ()).is_some());
        assert!(store.inspect(&"newcomer", |_| ()).is_some());
    }
}
