use std::fmt;

/// Errors raised by this crate.
///
/// Container operations never fail: detaching or looking up an identity that
/// is not registered is a silent no-op. The only failure is invoking a
/// [`WeakClosure`](crate::WeakClosure) whose context has been released.
///
/// 本 crate 产生的错误。容器操作从不失败；唯一的失败是调用上下文已被释放的
/// [`WeakClosure`](crate::WeakClosure)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The object a weak closure was bound to has already been dropped.
    /// 弱闭包绑定的对象已经被 drop。
    ContextReleased {
        /// Declaring scope of the closure (type name of its receiver).
        scope: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextReleased { scope } => write!(
                f,
                "cannot call a closure, instance of {scope} has already been released"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used by [`Callback::call`](crate::Callback::call).
pub type Result<T> = std::result::Result<T, Error>;
