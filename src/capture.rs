use crate::binding::Binding;
use crate::logging::debug;
use crate::state::ObjectId;
use crate::sync::Mutex;
use crate::table::{ObservationTable, Seq};
use std::fmt;
use std::sync::Arc;
use std::vec::Vec;

/// A set that captures its objects: registration keeps the object alive, and
/// release callbacks only fire on [`detach()`](Self::detach),
/// [`clear()`](Self::clear), or when the set is dropped.
///
/// Losing every external reference never releases a captured object, since
/// the set itself is always a path to it.
///
/// 捕获对象的集合：注册会保持对象存活，释放回调只在 `detach()`、`clear()`
/// 或集合被 drop 时触发。
pub struct ObservableCaptureSet<T> {
    table: Mutex<ObservationTable<Vec<Binding<T>>>>,
}

impl<T> ObservableCaptureSet<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            table: Mutex::new(ObservationTable::new()),
        }
    }

    /// Capture `object` with `on_release` and hand `object` back.
    ///
    /// Every call adds an independent registration, even for an object that is
    /// already captured.
    ///
    /// 以 `on_release` 捕获 `object` 并原样返回。每次调用都会新增一个独立的注册。
    pub fn watch<F>(&self, object: Arc<T>, on_release: F) -> Arc<T>
    where
        F: FnOnce(Arc<T>) + Send + 'static,
    {
        self.table
            .lock()
            .get_or_insert_with(ObjectId::of(&object), Vec::new)
            .push(Binding::new(Arc::clone(&object), on_release));

        object
    }

    /// Release `object`: drop the set's references and fire every callback
    /// registered for it. No-op when `object` is not captured.
    ///
    /// 释放 `object`：丢弃集合持有的引用并触发为其注册的每个回调。
    pub fn detach(&self, object: &Arc<T>) {
        let id = ObjectId::of(object);
        let released = self.table.lock().remove(id);

        if let Some(bindings) = released {
            debug!(object = ?id, callbacks = bindings.len(), "detach captured object");
            drop(bindings);
        }
    }

    /// Release every captured object, in insertion order.
    /// 按插入顺序释放所有被捕获的对象。
    pub fn clear(&self) {
        let released = self.table.lock().drain();
        drop(released);
    }

    #[inline]
    pub fn contains(&self, object: &Arc<T>) -> bool {
        self.table.lock().contains(ObjectId::of(object))
    }

    /// Number of captured objects.
    #[inline]
    pub fn count(&self) -> usize {
        self.table.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over the captured objects in insertion order.
    ///
    /// Same stepping rules as [`ObservableSet::iter`](crate::ObservableSet::iter).
    #[inline]
    pub fn iter(&self) -> CaptureIter<'_, T> {
        CaptureIter {
            set: self,
            cursor: None,
        }
    }
}

impl<T> Default for ObservableCaptureSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObservableCaptureSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCaptureSet")
            .field("count", &self.count())
            .finish()
    }
}

/// Iterator returned by [`ObservableCaptureSet::iter`].
pub struct CaptureIter<'a, T> {
    set: &'a ObservableCaptureSet<T>,
    cursor: Option<Seq>,
}

impl<T> Iterator for CaptureIter<'_, T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.set.table.lock();
        let (seq, bindings) = table.next_after(self.cursor, |_| true)?;

        self.cursor = Some(seq);
        bindings.first().map(|binding| Arc::clone(binding.reference()))
    }
}

impl<'a, T> IntoIterator for &'a ObservableCaptureSet<T> {
    type Item = Arc<T>;
    type IntoIter = CaptureIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
