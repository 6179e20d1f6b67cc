//! Release callbacks that fire exactly once when an observed object goes away,
//! and callbacks that hold their context object weakly.
//!
//! # Containers
//!
//! | Container                 | Holds                          | Fires on                                          |
//! |---------------------------|--------------------------------|---------------------------------------------------|
//! | [`ObservableSet`]         | objects (strong, one per registration) | detach, collection once only the set reaches the object, drop |
//! | [`ObservableCaptureSet`]  | objects (strong)               | detach, clear, drop                               |
//! | [`ObservableMap`]         | keys (strong), values (strong) | detach, replacement, collection once only the map reaches the key, drop |
//! | [`ObservableWeakMap`]     | keys (weak), values (strong)   | detach, replacement, collection once the key is dropped, drop |
//!
//! Every registration is a binding between a kept reference and a one-shot
//! callback. The callback runs from the binding's `Drop`, so it fires exactly
//! once however the registration ends, and never while a container lock is
//! held. Callbacks may therefore use the container they were registered with.
//!
//! Unreachability is noticed by a collection pass: `collect()` on the container,
//! also run automatically every N `watch()` calls (see [`ObserverBuilder`]).
//! References held by `ObservableSet` registrations and `ObservableMap` keys
//! are tracked per object across all containers, so an object shared by
//! several of them is released by each once only they are left.
//!
//! # Weak closures
//!
//! [`WeakClosure::create`] turns a [`Callback`] bound to a receiver into one that
//! only holds the receiver weakly. Calling it after the receiver was dropped
//! fails with [`Error::ContextReleased`].
//!
//! 当被观察对象消失时恰好触发一次的释放回调，以及弱持有其上下文对象的回调。
//! 每个注册都是保留引用与一次性回调之间的绑定。回调由绑定的 `Drop` 触发，
//! 因此无论注册以何种方式结束都恰好触发一次，且从不在持有容器锁时触发。
//! 不可达性由回收过程发现：容器上的 `collect()`，也会每 N 次 `watch()` 自动运行。

mod binding;
mod builder;
mod capture;
mod closure;
mod contract;
mod error;
mod holders;
mod logging;
mod map;
mod set;
mod state;
mod sync;
mod table;
mod weak_map;

pub use builder::ObserverBuilder;
pub use capture::{CaptureIter, ObservableCaptureSet};
pub use closure::{BodyKind, Callback, MethodFn, StaticFn, WeakClosure};
pub use contract::{WatchMap, WatchSet};
pub use error::{Error, Result};
pub use map::{MapIter, ObservableMap};
pub use set::{Iter, ObservableSet};
pub use state::ObjectId;
pub use weak_map::{ObservableWeakMap, WeakMapIter};

#[cfg(test)]
mod tests;
