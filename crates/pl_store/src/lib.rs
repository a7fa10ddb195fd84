//! pl_store — Remote storage adapters for Parley
//!
//! The backend is a managed document database, reached only through the
//! [`DocumentStore`] trait so the rest of the system never touches a
//! concrete client (and tests run against [`MemoryDocumentStore`]).
//!
//! # Error strategy
//! Absence is data (`Ok(None)`), never an error: a missing key record means
//! "not yet provisioned" and triggers provisioning. Permission rejections
//! from the backend are a distinct error kind because their remediation
//! (refresh the session) differs from a missing record's (provision it).
//!
//! # Modules
//! - `document`      — DocumentStore trait, snapshots, cancellable watches
//! - `memory`        — in-memory store for tests and simulation
//! - `keys`          — Key Store Adapter (public + sealed-private records)
//! - `conversations` — conversation records
//! - `messages`      — message append/list/watch
//! - `error`         — unified error type

pub mod conversations;
pub mod document;
pub mod error;
pub mod keys;
pub mod memory;
pub mod messages;

pub use conversations::ConversationStore;
pub use document::{CollectionSnapshot, Document, DocumentStore, WatchHandle};
pub use error::StoreError;
pub use keys::KeyStoreAdapter;
pub use memory::MemoryDocumentStore;
pub use messages::{MessageStore, MessageWatch};
