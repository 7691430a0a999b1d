//! registry-core: a concurrent directory mapping publisher identities to
//! the shared-memory buffers they own, with substring-filtered lookup and
//! change-notification callbacks.
//!
//! Two interchangeable storage variants implement the same
//! [`RegistryStore`] capability set:
//!
//! - [`InMemoryStore`] holds state in a pair of `RwLock`-guarded `Vec`s
//!   and does not survive process restart.
//! - [`SqliteStore`] persists items to a SQLite table via `rusqlite`, so
//!   a registry server can recover its directory after a crash.
//!
//! Callers that only need the capability set — an RPC service, for
//! instance — should hold a `dyn RegistryStore` rather than naming either
//! concrete type.

mod error;
mod memory;
mod model;
mod sqlite;
mod store;

pub use error::{RegistryError, Result};
pub use memory::InMemoryStore;
pub use model::{BufferLocation, Filter, NetEndpoint, RegItem};
pub use sqlite::SqliteStore;
pub use store::{Callback, CallbackId, RegistryStore};
