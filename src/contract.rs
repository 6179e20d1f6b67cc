//! The general observation contracts, for code that works with any container.
//!
//! 通用的观察契约，供适用于任意容器的代码使用。

use crate::capture::ObservableCaptureSet;
use crate::map::ObservableMap;
use crate::set::ObservableSet;
use crate::weak_map::ObservableWeakMap;
use std::sync::Arc;

/// A set of observed objects, each with release callbacks.
///
/// ```
/// use std::sync::Arc;
/// use weak_observe::{ObservableCaptureSet, ObservableSet, WatchSet};
///
/// fn track<S: WatchSet<u64>>(set: &S, id: u64) -> Arc<u64> {
///     set.watch(Arc::new(id), |id| println!("released {id}"))
/// }
///
/// let weak = ObservableSet::new();
/// let captured = ObservableCaptureSet::new();
/// let a = track(&weak, 1);
/// let b = track(&captured, 2);
/// assert_eq!((weak.count(), captured.count()), (1, 1));
/// # drop((a, b));
/// ```
pub trait WatchSet<T> {
    /// Register `on_release` for `object` and hand `object` back.
    fn watch<F>(&self, object: Arc<T>, on_release: F) -> Arc<T>
    where
        F: FnOnce(Arc<T>) + Send + 'static;

    /// Release `object` now, firing its callbacks. No-op when absent.
    fn detach(&self, object: &Arc<T>);

    /// Number of registered objects not yet released.
    fn count(&self) -> usize;
}

/// A map from observed keys to values with release callbacks.
pub trait WatchMap<K, V> {
    /// Associate `value` with `key` and hand `key` back. Replaces any
    /// previous value for `key`.
    fn watch<F>(&self, key: Arc<K>, value: Arc<V>, on_release: F) -> Arc<K>
    where
        F: FnOnce(Arc<V>) + Send + 'static;

    fn find(&self, key: &Arc<K>) -> Option<Arc<V>>;

    fn has(&self, key: &Arc<K>) -> bool;

    /// Release the entry for `key` now, firing its callback. No-op when absent.
    fn detach(&self, key: &Arc<K>);

    fn count(&self) -> usize;
}

macro_rules! impl_watch_set {
    ($($set:ident),*) => {$(
        impl<T> WatchSet<T> for $set<T> {
            #[inline]
            fn watch<F>(&self, object: Arc<T>, on_release: F) -> Arc<T>
            where
                F: FnOnce(Arc<T>) + Send + 'static,
            {
                $set::watch(self, object, on_release)
            }

            #[inline]
            fn detach(&self, object: &Arc<T>) {
                $set::detach(self, object)
            }

            #[inline]
            fn count(&self) -> usize {
                $set::count(self)
            }
        }
    )*};
}

macro_rules! impl_watch_map {
    ($($map:ident),*) => {$(
        impl<K, V> WatchMap<K, V> for $map<K, V> {
            #[inline]
            fn watch<F>(&self, key: Arc<K>, value: Arc<V>, on_release: F) -> Arc<K>
            where
                F: FnOnce(Arc<V>) + Send + 'static,
            {
                $map::watch(self, key, value, on_release)
            }

            #[inline]
            fn find(&self, key: &Arc<K>) -> Option<Arc<V>> {
                $map::find(self, key)
            }

            #[inline]
            fn has(&self, key: &Arc<K>) -> bool {
                $map::has(self, key)
            }

            #[inline]
            fn detach(&self, key: &Arc<K>) {
                $map::detach(self, key)
            }

            #[inline]
            fn count(&self) -> usize {
                $map::count(self)
            }
        }
    )*};
}

impl_watch_set!(ObservableSet, ObservableCaptureSet);
impl_watch_map!(ObservableMap, ObservableWeakMap);
