use std::fmt;
use std::sync::Arc;

/// Boxed one-shot release callback.
/// 装箱的一次性释放回调。
pub(crate) type ReleaseFn<T> = Box<dyn FnOnce(Arc<T>) + Send + 'static>;

/// Pairs a kept reference with its one-shot release callback.
///
/// The callback fires exactly once, from the binding's own `Drop`. Every
/// container releases an entry by dropping its binding: on `detach()`, on
/// replacement, during a collection pass, or when the container itself is
/// dropped. Containers never drop bindings while their table lock is held.
///
/// A binding holds its reference strongly. Whether that extends the observed
/// object's lifetime depends on what the reference points at: the watched
/// object itself (sets), or the value associated with a key (maps).
///
/// 将保留的引用与其一次性释放回调配对。
/// 回调恰好触发一次，由绑定自身的 `Drop` 触发。
/// 容器从不在持有表锁时 drop 绑定。
pub(crate) struct Binding<T: ?Sized> {
    reference: Arc<T>,
    on_release: Option<ReleaseFn<T>>,
}

impl<T: ?Sized> Binding<T> {
    pub(crate) fn new<F>(reference: Arc<T>, on_release: F) -> Self
    where
        F: FnOnce(Arc<T>) + Send + 'static,
    {
        Self {
            reference,
            on_release: Some(Box::new(on_release)),
        }
    }

    /// The kept reference.
    #[inline]
    pub(crate) fn reference(&self) -> &Arc<T> {
        &self.reference
    }
}

impl<T: ?Sized> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("reference", &Arc::as_ptr(&self.reference))
            .field("armed", &self.on_release.is_some())
            .finish()
    }
}

impl<T: ?Sized> Drop for Binding<T> {
    /// Fires the release callback with a clone of the kept reference.
    /// The binding's own clone is released right after.
    ///
    /// A panicking callback is not caught.
    ///
    /// 以保留引用的克隆触发释放回调，随后释放绑定自身持有的克隆。
    fn drop(&mut self) {
        if let Some(on_release) = self.on_release.take() {
            on_release(Arc::clone(&self.reference));
        }
    }
}
