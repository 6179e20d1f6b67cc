use crate::builder::CollectSchedule;
use crate::map::RawMap;
use crate::table::Seq;
use std::fmt;
use std::sync::{Arc, Weak};

/// A map with weakly held keys and strongly held values, releasing each value
/// through its callback once its key has been dropped.
///
/// The map never keeps a key alive. A value stays alive exactly as long as its
/// entry: until the key is dropped and a collection pass runs, or until
/// [`detach()`](Self::detach). Then `on_release(value)` fires.
///
/// [`find()`](Self::find) and [`has()`](Self::has) are pure lookups and never
/// fire callbacks. Iteration only yields entries whose key is still alive.
///
/// A value that itself holds a strong reference to its key keeps the key alive
/// through the map, so the entry can then only be released by `detach()`.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use weak_observe::ObservableWeakMap;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let map = ObservableWeakMap::new();
///
/// let hits = released.clone();
/// let key = map.watch(Arc::new(1u32), Arc::new("payload"), move |value| {
///     assert_eq!(*value, "payload");
///     hits.fetch_add(1, Ordering::SeqCst);
/// });
/// assert_eq!(map.find(&key).as_deref(), Some(&"payload"));
///
/// drop(key);
/// assert_eq!(map.collect(), 1);
/// assert_eq!(released.load(Ordering::SeqCst), 1);
/// ```
///
/// 键弱持有、值强持有的映射：键被 drop 后，通过回调释放其值。
/// 映射从不保持键存活。值的存活期与其条目完全一致：直到键被 drop 且执行了回收，
/// 或直到 `detach()`。此时触发 `on_release(value)`。
pub struct ObservableWeakMap<K, V> {
    raw: RawMap<K, Weak<K>, V>,
}

impl<K, V> ObservableWeakMap<K, V> {
    #[inline]
    pub fn new() -> Self {
        Self::with_schedule(CollectSchedule::default())
    }

    pub(crate) fn with_schedule(schedule: CollectSchedule) -> Self {
        Self {
            raw: RawMap::new(schedule),
        }
    }

    /// Associate `value` with `key` and hand `key` back.
    ///
    /// Watching a key again replaces its entry; the replaced callback fires
    /// before `watch()` returns.
    ///
    /// 将 `value` 关联到 `key` 并原样返回 `key`。再次 watch 会替换条目，
    /// 被替换的回调在 `watch()` 返回前触发。
    #[inline]
    pub fn watch<F>(&self, key: Arc<K>, value: Arc<V>, on_release: F) -> Arc<K>
    where
        F: FnOnce(Arc<V>) + Send + 'static,
    {
        self.raw.watch(key, value, on_release)
    }

    #[inline]
    pub fn find(&self, key: &Arc<K>) -> Option<Arc<V>> {
        self.raw.find(key)
    }

    #[inline]
    pub fn has(&self, key: &Arc<K>) -> bool {
        self.raw.has(key)
    }

    #[inline]
    pub fn detach(&self, key: &Arc<K>) {
        self.raw.detach(key)
    }

    /// Run a collection pass: release every entry whose key has been dropped.
    /// Returns the number of released entries.
    ///
    /// 执行一次回收：释放键已被 drop 的每个条目，返回被释放条目的数量。
    #[inline]
    pub fn collect(&self) -> usize {
        self.raw.collect()
    }

    /// Number of entries not yet released, including entries whose key is
    /// gone but which wait for the next collection pass.
    #[inline]
    pub fn count(&self) -> usize {
        self.raw.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over `(key, value)` pairs whose key is alive, in insertion order.
    #[inline]
    pub fn iter(&self) -> WeakMapIter<'_, K, V> {
        WeakMapIter {
            map: self,
            cursor: None,
        }
    }
}

impl<K, V> Default for ObservableWeakMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ObservableWeakMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableWeakMap")
            .field("count", &self.count())
            .finish()
    }
}

/// Iterator returned by [`ObservableWeakMap::iter`].
pub struct WeakMapIter<'a, K, V> {
    map: &'a ObservableWeakMap<K, V>,
    cursor: Option<Seq>,
}

impl<K, V> Iterator for WeakMapIter<'_, K, V> {
    type Item = (Arc<K>, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let (seq, key, value) = self.map.raw.next_pair(self.cursor)?;
        self.cursor = Some(seq);
        Some((key, value))
    }
}

impl<'a, K, V> IntoIterator for &'a ObservableWeakMap<K, V> {
    type Item = (Arc<K>, Arc<V>);
    type IntoIter = WeakMapIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
