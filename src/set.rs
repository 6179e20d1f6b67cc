use crate::binding::Binding;
use crate::builder::CollectSchedule;
use crate::holders::Holders;
use crate::logging::{debug, trace};
use crate::state::ObjectId;
use crate::sync::Mutex;
use crate::table::{ObservationTable, Seq};
use std::fmt;
use std::sync::Arc;
use std::vec::Vec;

/// All registrations for one observed identity. Never empty.
/// 同一被观察身份的全部注册。永不为空。
struct SetSlot<T> {
    bindings: Vec<Binding<T>>,
}

impl<T> SetSlot<T> {
    #[inline]
    fn object(&self) -> Option<&Arc<T>> {
        self.bindings.first().map(Binding::reference)
    }

    /// Nothing outside the collecting containers still reaches the object:
    /// every strong reference left is held by this slot or by another
    /// container's registration.
    ///
    /// 收集型容器之外已无任何路径可达该对象：剩余的每个强引用
    /// 都由本槽位或其他容器的注册持有。
    #[inline]
    fn is_orphaned(&self, holders: &Holders) -> bool {
        self.object().is_none_or(|object| holders.is_orphaned(object))
    }

    /// Withdraw this slot's references from the registry. Must happen before
    /// the slot is dropped.
    #[inline]
    fn unregister(&self, holders: &mut Holders) {
        if let Some(object) = self.object() {
            holders.release(ObjectId::of(object), self.bindings.len());
        }
    }
}

struct SetState<T> {
    table: ObservationTable<SetSlot<T>>,
    schedule: CollectSchedule,
}

/// A set of observed objects that fires each object's release callbacks once
/// nothing outside the set reaches the object anymore.
///
/// The set keeps one strong reference per registration, and notices during a
/// collection pass ([`collect()`](Self::collect)) that those are the only ones
/// left. Orphaned objects are hidden from iteration right away, and released
/// (callbacks fired, references dropped) by the next collection pass. Passes
/// also run automatically every N `watch()` calls, see [`ObserverBuilder`](crate::ObserverBuilder).
///
/// [`detach()`](Self::detach) releases an object immediately, whether or not it
/// is still referenced elsewhere. Dropping the set releases everything left.
///
/// Watching the same object twice creates two independent registrations; both
/// fire when the object is released. References held by other
/// `ObservableSet`s and by [`ObservableMap`](crate::ObservableMap) keys do not
/// count as external: an object watched by several of them is released by
/// each once only they are left.
///
/// A release callback that owns a clone of its own object keeps that object
/// reachable. Such a registration only ends through `detach()` or by
/// dropping the set.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use weak_observe::ObservableSet;
///
/// let released = Arc::new(AtomicBool::new(false));
/// let set = ObservableSet::new();
///
/// let flag = released.clone();
/// let object = set.watch(Arc::new("session"), move |_| flag.store(true, Ordering::SeqCst));
///
/// set.collect();
/// assert!(!released.load(Ordering::SeqCst));
///
/// drop(object);
/// set.collect();
/// assert!(released.load(Ordering::SeqCst));
/// assert_eq!(set.count(), 0);
/// ```
///
/// 一个被观察对象的集合：当集合之外不再有任何路径可达某对象时，触发其释放回调。
/// 集合为每个注册保留一个强引用，并在回收过程（`collect()`）中发现这些引用
/// 是否为仅剩的引用。孤立对象会立即从迭代中隐藏，并在下一次回收时被释放。
/// `detach()` 会立即释放对象。drop 集合会释放剩余的一切。
pub struct ObservableSet<T> {
    state: Mutex<SetState<T>>,
}

impl<T> ObservableSet<T> {
    /// Create an empty set with the default automatic collection interval.
    /// 创建一个带有默认自动回收间隔的空集合。
    #[inline]
    pub fn new() -> Self {
        Self::with_schedule(CollectSchedule::default())
    }

    pub(crate) fn with_schedule(schedule: CollectSchedule) -> Self {
        Self {
            state: Mutex::new(SetState {
                table: ObservationTable::new(),
                schedule,
            }),
        }
    }

    /// Register `on_release` for `object` and hand `object` back.
    ///
    /// 为 `object` 注册 `on_release` 并原样返回 `object`。
    pub fn watch<F>(&self, object: Arc<T>, on_release: F) -> Arc<T>
    where
        F: FnOnce(Arc<T>) + Send + 'static,
    {
        let id = ObjectId::of(&object);

        let collect_due = {
            let mut state = self.state.lock();
            state
                .table
                .get_or_insert_with(id, || SetSlot { bindings: Vec::new() })
                .bindings
                .push(Binding::new(Arc::clone(&object), on_release));
            Holders::with(|holders| holders.retain(id, 1));
            state.schedule.tick()
        };

        trace!(object = ?id, "watch");

        if collect_due {
            self.collect();
        }

        object
    }

    /// Remove every registration for `object` and fire their callbacks now.
    ///
    /// No-op when `object` is not registered.
    ///
    /// 移除 `object` 的所有注册并立即触发其回调。若未注册则为空操作。
    pub fn detach(&self, object: &Arc<T>) {
        let id = ObjectId::of(object);
        let released = self.state.lock().table.remove(id);

        if let Some(slot) = released {
            Holders::with(|holders| slot.unregister(holders));
            debug!(object = ?id, callbacks = slot.bindings.len(), "detach");
            drop(slot);
        }
    }

    /// Run a collection pass: release every object that nothing outside the
    /// set reaches anymore. Returns the number of released objects.
    ///
    /// Callbacks run after the internal lock is released, so they may use the
    /// set again.
    ///
    /// 执行一次回收：释放集合之外已不可达的每个对象，返回被释放对象的数量。
    /// 回调在内部锁释放后运行，因此回调中可以再次使用该集合。
    pub fn collect(&self) -> usize {
        let released = {
            let mut state = self.state.lock();
            Holders::with(|holders| {
                let released = state.table.extract_if(|slot| slot.is_orphaned(holders));
                for slot in &released {
                    slot.unregister(holders);
                }
                released
            })
        };
        let count = released.len();

        if count > 0 {
            debug!(released = count, "observable set collected");
        }

        drop(released);
        count
    }

    /// Whether `object` is currently registered.
    #[inline]
    pub fn contains(&self, object: &Arc<T>) -> bool {
        self.state.lock().table.contains(ObjectId::of(object))
    }

    /// Number of registered objects not yet released, counting orphans that
    /// wait for the next collection pass.
    ///
    /// 尚未释放的已注册对象数量，包括等待下一次回收的孤立对象。
    #[inline]
    pub fn count(&self) -> usize {
        self.state.lock().table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over the objects still reachable from outside the set, in
    /// insertion order.
    ///
    /// The iterator holds no lock and no reference between steps; each step
    /// clones the next object's `Arc`. Objects detached or released meanwhile
    /// are skipped. Call `iter()` again to restart.
    ///
    /// 按插入顺序迭代集合之外仍可达的对象。
    /// 迭代器在步骤之间不持有锁和引用；期间被移除的对象会被跳过。
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            set: self,
            cursor: None,
        }
    }
}

impl<T> Drop for ObservableSet<T> {
    fn drop(&mut self) {
        let released = self.state.lock().table.drain();
        Holders::with(|holders| {
            for slot in &released {
                slot.unregister(holders);
            }
        });
        drop(released);
    }
}

impl<T> Default for ObservableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObservableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSet")
            .field("count", &self.count())
            .finish()
    }
}

/// Iterator returned by [`ObservableSet::iter`].
pub struct Iter<'a, T> {
    set: &'a ObservableSet<T>,
    cursor: Option<Seq>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.set.state.lock();
        Holders::with(|holders| {
            let (seq, slot) = state
                .table
                .next_after(self.cursor, |slot| !slot.is_orphaned(holders))?;

            self.cursor = Some(seq);
            slot.object().cloned()
        })
    }
}

impl<'a, T> IntoIterator for &'a ObservableSet<T> {
    type Item = Arc<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
