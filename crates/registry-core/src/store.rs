//! The [`RegistryStore`] capability set, implemented by both the in-memory
//! and persistent variants.

use crate::error::Result;
use crate::model::{Filter, RegItem};

/// Invoked synchronously, on the mutating caller's thread, with the full
/// current match set for the callback's filter. Must not panic: a
/// callback that panics is undefined behavior from the store's
/// perspective (callers should catch and log, never let it unwind across
/// the store's call stack).
pub type Callback = Box<dyn Fn(&[RegItem]) + Send + Sync>;

/// Opaque handle returned by [`RegistryStore::add_callback`], used to
/// remove that registration later.
///
/// The original C++ store identified a callback registration by
/// structural equality on `(Filter, Callback)`, which does not translate
/// to Rust: trait objects and closures have no general `PartialEq`. A
/// generated handle is the idiomatic replacement and is strictly less
/// error-prone (no risk of two textually-identical filters colliding).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(pub(crate) u64);

/// A concurrent multi-set of [`RegItem`]s (unique under `(owner,
/// location.name)` equality) plus a list of `(Filter, Callback)`
/// subscriptions.
///
/// All operations are safe for concurrent callers. See the module-level
/// documentation on each implementor for its locking discipline.
pub trait RegistryStore: Send + Sync {
    /// Appends `ri` if no equal item is already present, then evaluates
    /// callbacks. Idempotent on duplicates.
    fn register(&self, ri: RegItem) -> Result<()>;

    /// Removes the first item equal to `ri`, if any, then evaluates
    /// callbacks. Idempotent on absent items.
    fn unregister(&self, ri: RegItem) -> Result<()>;

    /// Returns a snapshot of items whose owner matches `f`, in insertion
    /// order.
    fn lookup(&self, f: &Filter) -> Result<Vec<RegItem>>;

    /// Registers `cb` under `f`, then immediately invokes it once with
    /// the filter's current match set so the subscriber sees the state
    /// as of registration.
    fn add_callback(&self, f: Filter, cb: Callback) -> Result<CallbackId>;

    /// Removes a callback registration by the handle returned from
    /// [`RegistryStore::add_callback`]. A no-op if already removed.
    fn remove_callback(&self, id: CallbackId);
}
