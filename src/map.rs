use crate::binding::Binding;
use crate::builder::CollectSchedule;
use crate::holders::Holders;
use crate::logging::{debug, trace};
use crate::state::ObjectId;
use crate::sync::Mutex;
use crate::table::{ObservationTable, Seq};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// How a map holds its keys.
///
/// - `Arc<K>`: the map owns a strong reference, registered with
///   [`Holders`]; an entry is reclaimable once only collecting containers
///   still reference the key.
/// - `Weak<K>`: the map does not keep the key alive; an entry is reclaimable
///   once the key has been dropped.
///
/// 映射持有键的方式。
/// - `Arc<K>`：映射持有强引用；当该引用是仅剩的引用时，条目可被回收。
/// - `Weak<K>`：映射不保持键存活；当键被 drop 后，条目可被回收。
pub(crate) trait KeyHold<K>: Sized {
    /// Strong references to the key that one entry holds.
    const STRONG_REFS: usize;

    fn hold(key: &Arc<K>) -> Self;

    /// The key, if it is still reachable from outside the containers.
    fn resolve(&self, holders: &Holders) -> Option<Arc<K>>;

    fn is_reclaimable(&self, holders: &Holders) -> bool;
}

impl<K> KeyHold<K> for Arc<K> {
    const STRONG_REFS: usize = 1;

    #[inline]
    fn hold(key: &Arc<K>) -> Self {
        Arc::clone(key)
    }

    #[inline]
    fn resolve(&self, holders: &Holders) -> Option<Arc<K>> {
        (!self.is_reclaimable(holders)).then(|| Arc::clone(self))
    }

    #[inline]
    fn is_reclaimable(&self, holders: &Holders) -> bool {
        holders.is_orphaned(self)
    }
}

impl<K> KeyHold<K> for Weak<K> {
    const STRONG_REFS: usize = 0;

    #[inline]
    fn hold(key: &Arc<K>) -> Self {
        Arc::downgrade(key)
    }

    #[inline]
    fn resolve(&self, _holders: &Holders) -> Option<Arc<K>> {
        self.upgrade()
    }

    #[inline]
    fn is_reclaimable(&self, _holders: &Holders) -> bool {
        self.strong_count() == 0
    }
}

pub(crate) struct MapEntry<H, V> {
    id: ObjectId,
    key: H,
    binding: Binding<V>,
}

impl<H, V> MapEntry<H, V> {
    #[inline]
    fn value(&self) -> &Arc<V> {
        self.binding.reference()
    }
}

struct MapState<H, V> {
    table: ObservationTable<MapEntry<H, V>>,
    schedule: CollectSchedule,
}

/// Shared machinery of [`ObservableMap`] and
/// [`ObservableWeakMap`](crate::ObservableWeakMap), parameterised over how
/// keys are held.
///
/// Every entry owns a binding around its value: the value stays alive as long
/// as the entry exists, and `on_release(value)` fires when the entry goes away
/// (detach, replacement, collection, or drop of the map).
///
/// [`ObservableMap`] 与 [`ObservableWeakMap`](crate::ObservableWeakMap) 的共享实现，
/// 以键的持有方式为参数。每个条目拥有一个包裹其值的绑定：
/// 条目存在时值保持存活，条目消失时触发 `on_release(value)`。
pub(crate) struct RawMap<K, H: KeyHold<K>, V> {
    state: Mutex<MapState<H, V>>,
    _key: PhantomData<fn() -> K>,
}

impl<K, H: KeyHold<K>, V> RawMap<K, H, V> {
    pub(crate) fn new(schedule: CollectSchedule) -> Self {
        Self {
            state: Mutex::new(MapState {
                table: ObservationTable::new(),
                schedule,
            }),
            _key: PhantomData,
        }
    }

    pub(crate) fn watch<F>(&self, key: Arc<K>, value: Arc<V>, on_release: F) -> Arc<K>
    where
        F: FnOnce(Arc<V>) + Send + 'static,
    {
        let id = ObjectId::of(&key);
        let entry = MapEntry {
            id,
            key: H::hold(&key),
            binding: Binding::new(value, on_release),
        };

        let (replaced, collect_due) = {
            let mut state = self.state.lock();
            let replaced = state.table.insert(id, entry);
            // a replaced entry hands its key reference over to the new one
            if replaced.is_none() {
                Holders::with(|holders| holders.retain(id, H::STRONG_REFS));
            }
            (replaced, state.schedule.tick())
        };

        if let Some(replaced) = replaced {
            debug!(key = ?id, "watch replaced a previous value");
            drop(replaced);
        } else {
            trace!(key = ?id, "watch");
        }

        if collect_due {
            self.collect();
        }

        key
    }

    pub(crate) fn find(&self, key: &Arc<K>) -> Option<Arc<V>> {
        self.state
            .lock()
            .table
            .get(ObjectId::of(key))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn has(&self, key: &Arc<K>) -> bool {
        self.state.lock().table.contains(ObjectId::of(key))
    }

    pub(crate) fn detach(&self, key: &Arc<K>) {
        let id = ObjectId::of(key);
        let released = self.state.lock().table.remove(id);

        if let Some(entry) = released {
            Holders::with(|holders| holders.release(id, H::STRONG_REFS));
            debug!(key = ?id, "detach");
            drop(entry);
        }
    }

    pub(crate) fn collect(&self) -> usize {
        let released = {
            let mut state = self.state.lock();
            Holders::with(|holders| {
                let released = state
                    .table
                    .extract_if(|entry| entry.key.is_reclaimable(holders));
                for entry in &released {
                    holders.release(entry.id, H::STRONG_REFS);
                }
                released
            })
        };
        let count = released.len();

        if count > 0 {
            debug!(released = count, "observable map collected");
        }

        drop(released);
        count
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.state.lock().table.len()
    }

    /// Next live `(key, value)` pair after `cursor`, with its sequence number.
    pub(crate) fn next_pair(&self, cursor: Option<Seq>) -> Option<(Seq, Arc<K>, Arc<V>)> {
        let state = self.state.lock();
        Holders::with(|holders| {
            let mut key = None;
            let (seq, entry) = state.table.next_after(cursor, |entry| {
                key = entry.key.resolve(holders);
                key.is_some()
            })?;

            key.map(|key| (seq, key, Arc::clone(entry.value())))
        })
    }
}

impl<K, H: KeyHold<K>, V> Drop for RawMap<K, H, V> {
    fn drop(&mut self) {
        let released = self.state.lock().table.drain();
        if H::STRONG_REFS > 0 {
            Holders::with(|holders| {
                for entry in &released {
                    holders.release(entry.id, H::STRONG_REFS);
                }
            });
        }
        drop(released);
    }
}

/// A map from observed keys to values, releasing each value through its
/// callback once its entry goes away.
///
/// Keys are held strongly. An entry is released:
/// - on [`detach()`](Self::detach),
/// - when [`watch()`](Self::watch) replaces it (the replaced callback fires
///   before `watch()` returns),
/// - by a collection pass once nothing outside the map reaches the key,
/// - when the map is dropped.
///
/// Iteration hides entries whose key is only reachable through the map.
///
/// Keys shared with other collecting containers (another `ObservableMap`, an
/// [`ObservableSet`](crate::ObservableSet)) are released once only those
/// containers reference them. A release callback or value that owns a clone
/// of its key keeps the key reachable; such an entry only ends through
/// `detach()`, replacement, or dropping the map.
///
/// 从被观察键到值的映射，条目消失时通过回调释放其值。
/// 键被强持有。条目在以下情况被释放：`detach()`；被 `watch()` 替换
/// （被替换的回调在 `watch()` 返回前触发）；在映射之外不再可达键时的回收过程；
/// 映射被 drop 时。
pub struct ObservableMap<K, V> {
    raw: RawMap<K, Arc<K>, V>,
}

impl<K, V> ObservableMap<K, V> {
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
    /// A key holds a single value: watching it again replaces the previous
    /// entry, whose callback fires immediately.
    ///
    /// 将 `value` 关联到 `key` 并原样返回 `key`。
    /// 一个键只持有一个值：再次 watch 会替换先前的条目，其回调立即触发。
    #[inline]
    pub fn watch<F>(&self, key: Arc<K>, value: Arc<V>, on_release: F) -> Arc<K>
    where
        F: FnOnce(Arc<V>) + Send + 'static,
    {
        self.raw.watch(key, value, on_release)
    }

    /// The value associated with `key`. Never fires a callback.
    #[inline]
    pub fn find(&self, key: &Arc<K>) -> Option<Arc<V>> {
        self.raw.find(key)
    }

    #[inline]
    pub fn has(&self, key: &Arc<K>) -> bool {
        self.raw.has(key)
    }

    /// Remove the entry for `key` and fire its callback now. No-op when absent.
    #[inline]
    pub fn detach(&self, key: &Arc<K>) {
        self.raw.detach(key)
    }

    /// Run a collection pass: release every entry whose key is no longer
    /// reachable from outside the map. Returns the number of released entries.
    ///
    /// 执行一次回收：释放键在映射之外已不可达的每个条目，返回被释放条目的数量。
    #[inline]
    pub fn collect(&self) -> usize {
        self.raw.collect()
    }

    /// Number of entries not yet released.
    #[inline]
    pub fn count(&self) -> usize {
        self.raw.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> MapIter<'_, K, V> {
        MapIter {
            map: self,
            cursor: None,
        }
    }
}

impl<K, V> Default for ObservableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("count", &self.count())
            .finish()
    }
}

/// Iterator returned by [`ObservableMap::iter`].
pub struct MapIter<'a, K, V> {
    map: &'a ObservableMap<K, V>,
    cursor: Option<Seq>,
}

impl<K, V> Iterator for MapIter<'_, K, V> {
    type Item = (Arc<K>, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let (seq, key, value) = self.map.raw.next_pair(self.cursor)?;
        self.cursor = Some(seq);
        Some((key, value))
    }
}

impl<'a, K, V> IntoIterator for &'a ObservableMap<K, V> {
    type Item = (Arc<K>, Arc<V>);
    type IntoIter = MapIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
