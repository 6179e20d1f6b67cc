use crate::error::{Error, Result};
use crate::logging::debug;
use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};

/// A function with no receiver, taking its arguments as a tuple.
///
/// Implemented for every `Fn(A1, .., An) -> R + Send + Sync + 'static` with up
/// to four arguments; `A` is then `(A1, .., An)`.
///
/// 无接收者的函数，以元组形式接收参数。
pub trait StaticFn<A, R>: Send + Sync + 'static {
    fn invoke(&self, args: A) -> R;
}

/// A function dispatched against a receiver, taking its other arguments as a
/// tuple. Covers both method paths (`Counter::get`) and closures whose first
/// parameter is the receiver (`|this: &Counter, step: u32| ..`).
///
/// Implemented for every `Fn(&T, A1, .., An) -> R + Send + Sync + 'static`
/// with up to four extra arguments.
///
/// 针对接收者分派的函数，其余参数以元组形式传入。
/// 同时涵盖方法路径（`Counter::get`）和首个参数为接收者的闭包。
pub trait MethodFn<T: ?Sized, A, R>: Send + Sync + 'static {
    fn invoke(&self, receiver: &T, args: A) -> R;
}

macro_rules! impl_fn_traits {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> StaticFn<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> R {
                self($($arg),*)
            }
        }

        impl<T: ?Sized, F, R, $($arg,)*> MethodFn<T, ($($arg,)*), R> for F
        where
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&self, receiver: &T, ($($arg,)*): ($($arg,)*)) -> R {
                self(receiver, $($arg),*)
            }
        }
    };
}

impl_fn_traits!();
impl_fn_traits!(A1);
impl_fn_traits!(A1, A2);
impl_fn_traits!(A1, A2, A3);
impl_fn_traits!(A1, A2, A3, A4);

/// How a bound body was supplied.
/// 绑定体的提供方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A named method path, re-dispatched against the resolved receiver.
    /// Access checks were made where the path was named, so private methods
    /// stay callable through the callback.
    Method,
    /// An anonymous closure taking the receiver as its first parameter.
    Anonymous,
}

/// A callback body detached from its receiver.
struct Body<T: ?Sized, A, R> {
    kind: BodyKind,
    /// `type_name` of the function or closure type, for diagnostics only.
    /// Dispatch goes through `func`, never through this name.
    name: &'static str,
    func: Arc<dyn MethodFn<T, A, R>>,
}

impl<T: ?Sized, A, R> Clone for Body<T, A, R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            name: self.name,
            func: Arc::clone(&self.func),
        }
    }
}

enum Repr<T: ?Sized, A, R> {
    Static(Arc<dyn StaticFn<A, R>>),
    Bound { context: Arc<T>, body: Body<T, A, R> },
    Weak(WeakClosure<T, A, R>),
}

/// A callable, optionally bound to a receiver object (its context).
///
/// - [`Callback::unbound`]: no context.
/// - [`Callback::method`] / [`Callback::closure`]: bound to a receiver, which
///   the callback keeps alive.
/// - [`WeakClosure::create`] turns a bound callback into one that only holds its
///   receiver weakly.
///
/// Arguments are passed as a tuple: `callback.call(())`, `callback.call((1, "a"))`.
///
/// 一个可调用对象，可选地绑定到一个接收者对象（其上下文）。
/// 参数以元组形式传入。
pub struct Callback<T: ?Sized, A = (), R = ()> {
    repr: Repr<T, A, R>,
}

impl<T: ?Sized + 'static, A: 'static, R: 'static> Callback<T, A, R> {
    /// A callback with no context.
    #[inline]
    pub fn unbound<F>(func: F) -> Self
    where
        F: StaticFn<A, R>,
    {
        Self {
            repr: Repr::Static(Arc::new(func)),
        }
    }

    /// Bind a named method to `receiver`: `Callback::method(&counter, Counter::get)`.
    ///
    /// 将具名方法绑定到 `receiver`。
    #[inline]
    pub fn method<F>(receiver: &Arc<T>, method: F) -> Self
    where
        F: MethodFn<T, A, R>,
    {
        Self::bound(receiver, BodyKind::Method, method)
    }

    /// Bind an anonymous closure to `receiver`; the closure gets the receiver
    /// as its first parameter.
    ///
    /// 将匿名闭包绑定到 `receiver`；闭包的第一个参数为接收者。
    #[inline]
    pub fn closure<F>(receiver: &Arc<T>, closure: F) -> Self
    where
        F: MethodFn<T, A, R>,
    {
        Self::bound(receiver, BodyKind::Anonymous, closure)
    }

    fn bound<F>(receiver: &Arc<T>, kind: BodyKind, func: F) -> Self
    where
        F: MethodFn<T, A, R>,
    {
        Self {
            repr: Repr::Bound {
                context: Arc::clone(receiver),
                body: Body {
                    kind,
                    name: type_name::<F>(),
                    func: Arc::new(func),
                },
            },
        }
    }

    /// Shorthand for [`WeakClosure::create`].
    #[inline]
    pub fn downgrade(self) -> Self {
        WeakClosure::create(self)
    }

    /// Invoke the callback.
    ///
    /// Only fails for a weak callback whose context has been released, see
    /// [`WeakClosure::call`].
    ///
    /// 调用回调。仅当弱回调的上下文已被释放时失败。
    pub fn call(&self, args: A) -> Result<R> {
        match &self.repr {
            Repr::Static(func) => Ok(func.invoke(args)),
            Repr::Bound { context, body } => Ok(body.func.invoke(context, args)),
            Repr::Weak(weak) => weak.call(args),
        }
    }

    /// Whether the callback has a context object, strong or weak.
    #[inline]
    pub fn is_bound(&self) -> bool {
        !matches!(self.repr, Repr::Static(_))
    }

    #[inline]
    pub fn is_weak(&self) -> bool {
        matches!(self.repr, Repr::Weak(_))
    }

    #[inline]
    pub fn as_weak(&self) -> Option<&WeakClosure<T, A, R>> {
        match &self.repr {
            Repr::Weak(weak) => Some(weak),
            _ => None,
        }
    }

    /// Whether both callbacks are the same callable: same function, and same
    /// context object if any.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Static(a), Repr::Static(b)) => Arc::ptr_eq(a, b),
            (
                Repr::Bound { context: a, body: fa },
                Repr::Bound { context: b, body: fb },
            ) => Arc::ptr_eq(a, b) && Arc::ptr_eq(&fa.func, &fb.func),
            (Repr::Weak(a), Repr::Weak(b)) => {
                Weak::ptr_eq(&a.context, &b.context) && Arc::ptr_eq(&a.body.func, &b.body.func)
            }
            _ => false,
        }
    }
}

impl<T: ?Sized, A, R> Clone for Callback<T, A, R> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Static(func) => Repr::Static(Arc::clone(func)),
            Repr::Bound { context, body } => Repr::Bound {
                context: Arc::clone(context),
                body: body.clone(),
            },
            Repr::Weak(weak) => Repr::Weak(weak.clone()),
        };
        Self { repr }
    }
}

impl<T: ?Sized, A, R> From<WeakClosure<T, A, R>> for Callback<T, A, R> {
    fn from(weak: WeakClosure<T, A, R>) -> Self {
        Self {
            repr: Repr::Weak(weak),
        }
    }
}

impl<T: ?Sized + 'static, A: 'static, R: 'static> fmt::Debug for Callback<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Static(_) => f.write_str("Callback::Static"),
            Repr::Bound { body, .. } => f
                .debug_struct("Callback::Bound")
                .field("kind", &body.kind)
                .field("name", &body.name)
                .finish(),
            Repr::Weak(weak) => fmt::Debug::fmt(weak, f),
        }
    }
}

/// A callback that holds its context object weakly.
///
/// States: bound while the context is alive, released once it has been
/// dropped. The transition is one-way and only noticed when the closure is
/// called.
///
/// Calling a released closure always fails with
/// [`Error::ContextReleased`]; the body is never run without its receiver.
///
/// ```
/// use std::sync::Arc;
/// use weak_observe::{Callback, Error, WeakClosure};
///
/// struct Greeter { name: String }
///
/// impl Greeter {
///     fn greet(&self, greeting: &'static str) -> String {
///         format!("{greeting}, {}", self.name)
///     }
/// }
///
/// let greeter = Arc::new(Greeter { name: "Ada".into() });
/// let callback = WeakClosure::create(Callback::method(&greeter, Greeter::greet));
///
/// assert_eq!(callback.call(("Hello",)).unwrap(), "Hello, Ada");
///
/// drop(greeter);
/// assert!(matches!(callback.call(("Hello",)), Err(Error::ContextReleased { .. })));
/// ```
///
/// 弱持有其上下文对象的回调。
/// 状态：上下文存活时为已绑定，上下文被 drop 后为已释放。
/// 该转换单向且仅在调用时被察觉。调用已释放的闭包总是返回
/// [`Error::ContextReleased`]；绝不会在没有接收者的情况下执行闭包体。
pub struct WeakClosure<T: ?Sized, A = (), R = ()> {
    scope: &'static str,
    context: Weak<T>,
    body: Body<T, A, R>,
}

impl<T: ?Sized + 'static, A: 'static, R: 'static> WeakClosure<T, A, R> {
    /// Make `callback` hold its context weakly.
    ///
    /// Callbacks without context, and callbacks that are already weak, are
    /// returned unchanged. A bound callback gives up its strong reference to
    /// the context.
    ///
    /// 使 `callback` 弱持有其上下文。
    /// 无上下文的回调和已经是弱引用的回调原样返回。
    /// 已绑定的回调会放弃其对上下文的强引用。
    pub fn create(callback: Callback<T, A, R>) -> Callback<T, A, R> {
        match callback.repr {
            Repr::Bound { context, body } => Self {
                scope: type_name::<T>(),
                context: Arc::downgrade(&context),
                body,
            }
            .into(),
            repr => Callback { repr },
        }
    }

    /// Resolve the context and run the body against it.
    ///
    /// Fails with [`Error::ContextReleased`] once the context has been
    /// dropped, on this and every later call.
    ///
    /// 解析上下文并针对其运行闭包体。上下文被 drop 后，本次及之后的每次调用
    /// 都返回 [`Error::ContextReleased`]。
    pub fn call(&self, args: A) -> Result<R> {
        match self.context.upgrade() {
            Some(receiver) => Ok(self.body.func.invoke(&receiver, args)),
            None => {
                debug!(scope = self.scope, body = self.body.name, "weak closure called after release");
                Err(Error::ContextReleased { scope: self.scope })
            }
        }
    }

    /// The context object, if it is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.context.upgrade()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.context.strong_count() == 0
    }

    /// Declaring scope: the type name of the receiver.
    #[inline]
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    #[inline]
    pub fn kind(&self) -> BodyKind {
        self.body.kind
    }
}

impl<T: ?Sized, A, R> Clone for WeakClosure<T, A, R> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope,
            context: Weak::clone(&self.context),
            body: self.body.clone(),
        }
    }
}

impl<T: ?Sized + 'static, A: 'static, R: 'static> fmt::Debug for WeakClosure<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakClosure")
            .field("scope", &self.scope)
            .field("kind", &self.body.kind)
            .field("released", &self.is_released())
            .finish()
    }
}
