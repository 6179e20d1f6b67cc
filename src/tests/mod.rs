mod basic_tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 释放回调计数器：统计回调被触发的次数
#[derive(Clone, Default)]
pub(crate) struct Tally {
    fired: Arc<AtomicUsize>,
}

impl Tally {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 生成一个每次触发都会计数一次的释放回调
    pub(crate) fn hook<T>(&self) -> impl FnOnce(Arc<T>) + Send + 'static {
        let fired = Arc::clone(&self.fired);
        move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn fired(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}
