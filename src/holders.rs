use crate::state::ObjectId;
use crate::sync::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide count of the strong references that collecting containers
/// hold, per observed identity.
///
/// An object is unreachable from outside once its `strong_count` is no larger
/// than this count, whichever containers the references belong to. Only
/// [`ObservableSet`](crate::ObservableSet) registrations and
/// [`ObservableMap`](crate::ObservableMap) keys are counted; references that
/// keep an object alive for good reason (captured objects, map values) are not.
///
/// The count never exceeds the references actually held: containers add to
/// it after creating their clone and subtract before dropping it.
///
/// 收集型容器按被观察身份持有的强引用的全进程计数。
/// 当对象的 `strong_count` 不大于该计数时，无论这些引用属于哪个容器，
/// 该对象在外部都已不可达。计数从不超过实际持有的引用：
/// 容器在创建克隆之后增加计数，在 drop 克隆之前减少计数。
#[derive(Debug, Default)]
pub(crate) struct Holders {
    counts: HashMap<ObjectId, usize>,
}

#[cfg(not(feature = "loom"))]
static HOLDERS: std::sync::LazyLock<Mutex<Holders>> =
    std::sync::LazyLock::new(|| Mutex::new(Holders::default()));

#[cfg(feature = "loom")]
loom::lazy_static! {
    static ref HOLDERS: Mutex<Holders> = Mutex::new(Holders::default());
}

impl Holders {
    /// Run `f` with the registry locked.
    ///
    /// Lock order: a container's own lock first, then this one. Callbacks
    /// never run inside `f`.
    #[inline]
    pub(crate) fn with<R>(f: impl FnOnce(&mut Holders) -> R) -> R {
        f(&mut HOLDERS.lock())
    }

    #[inline]
    pub(crate) fn retain(&mut self, id: ObjectId, references: usize) {
        if references > 0 {
            *self.counts.entry(id).or_default() += references;
        }
    }

    pub(crate) fn release(&mut self, id: ObjectId, references: usize) {
        if let Some(count) = self.counts.get_mut(&id) {
            *count = count.saturating_sub(references);
            if *count == 0 {
                self.counts.remove(&id);
            }
        }
    }

    #[inline]
    pub(crate) fn count(&self, id: ObjectId) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Nothing but collecting containers still reaches `object`.
    /// 除收集型容器之外已无任何路径可达 `object`。
    #[inline]
    pub(crate) fn is_orphaned<T>(&self, object: &Arc<T>) -> bool {
        Arc::strong_count(object) <= self.count(ObjectId::of(object))
    }
}
