use std::fmt;
use std::sync::Arc;

/// Default number of `watch()` calls between automatic collection passes.
/// 两次自动回收之间默认的 `watch()` 调用次数。
pub(crate) const AUTO_COLLECT_INTERVAL: usize = 64;

/// Identity of an observed object: the address of its `Arc` allocation.
///
/// Containers keep either an `Arc` or a `Weak` to every object they index.
/// Both keep the allocation alive, so an identity held by a container is never
/// handed to a new object while the entry exists.
///
/// 被观察对象的身份：其 `Arc` 分配的地址。
/// 容器对每个被索引的对象持有 `Arc` 或 `Weak`，两者都会保持分配存活，
/// 因此在条目存在期间该身份不会被新对象复用。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Identity of the object behind a strong reference.
    #[inline]
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        ObjectId(Arc::as_ptr(object) as *const () as usize)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({:#x})", self.0)
    }
}
