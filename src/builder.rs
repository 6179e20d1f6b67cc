use crate::map::ObservableMap;
use crate::set::ObservableSet;
use crate::state::AUTO_COLLECT_INTERVAL;
use crate::weak_map::ObservableWeakMap;

/// Builder for configuring the collecting containers
/// ([`ObservableSet`], [`ObservableMap`], [`ObservableWeakMap`]).
///
/// - `auto_collect_interval`: run `collect()` automatically every N `watch()` calls
///
/// # Example
/// ```
/// use weak_observe::ObserverBuilder;
///
/// let set = ObserverBuilder::new()
///     .auto_collect_interval(128)
///     .set::<String>();
///
/// let map = ObserverBuilder::new()
///     .auto_collect_interval(None)
///     .weak_map::<String, Vec<u8>>();
/// # drop((set, map));
/// ```
///
/// 用于配置可回收容器的构建器。
#[derive(Debug, Clone, Copy)]
pub struct ObserverBuilder {
    auto_collect_interval: Option<usize>,
}

impl ObserverBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            auto_collect_interval: Some(AUTO_COLLECT_INTERVAL),
        }
    }

    /// Set the automatic collection interval.
    ///
    /// Every `interval`-th call to `watch()` runs a collection pass before
    /// returning. Pass `None` (or `0`) to disable automatic collection; release
    /// of orphaned entries then only happens on an explicit `collect()`,
    /// `detach()`, or when the container is dropped.
    ///
    /// Default: `Some(64)`
    ///
    /// 设置自动回收间隔。
    /// 每第 `interval` 次 `watch()` 调用会在返回前执行一次回收。
    /// 传递 `None`（或 `0`）可禁用自动回收。
    #[inline]
    pub fn auto_collect_interval(mut self, interval: impl Into<Option<usize>>) -> Self {
        self.auto_collect_interval = interval.into().filter(|n| *n > 0);
        self
    }

    /// Build an [`ObservableSet`] with the configured settings.
    #[inline]
    pub fn set<T>(self) -> ObservableSet<T> {
        ObservableSet::with_schedule(CollectSchedule::new(self.auto_collect_interval))
    }

    /// Build an [`ObservableMap`] with the configured settings.
    #[inline]
    pub fn map<K, V>(self) -> ObservableMap<K, V> {
        ObservableMap::with_schedule(CollectSchedule::new(self.auto_collect_interval))
    }

    /// Build an [`ObservableWeakMap`] with the configured settings.
    #[inline]
    pub fn weak_map<K, V>(self) -> ObservableWeakMap<K, V> {
        ObservableWeakMap::with_schedule(CollectSchedule::new(self.auto_collect_interval))
    }
}

impl Default for ObserverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts `watch()` calls and decides when an automatic collection is due.
/// Lives inside a container's lock.
///
/// 统计 `watch()` 调用次数并决定何时进行自动回收。位于容器的锁内。
#[derive(Debug)]
pub(crate) struct CollectSchedule {
    interval: Option<usize>,
    watches: usize,
}

impl CollectSchedule {
    pub(crate) fn new(interval: Option<usize>) -> Self {
        Self { interval, watches: 0 }
    }

    /// Record one `watch()`; returns `true` when a collection pass is due.
    #[inline]
    pub(crate) fn tick(&mut self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };

        self.watches += 1;
        if self.watches >= interval {
            self.watches = 0;
            true
        } else {
            false
        }
    }
}

impl Default for CollectSchedule {
    fn default() -> Self {
        Self::new(Some(AUTO_COLLECT_INTERVAL))
    }
}
