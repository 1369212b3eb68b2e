//! Local-first entity store with session-scoped overlay and cloud
//! reconciliation.
//!
//! Anonymous users create and manipulate projects, tasks, milestones and
//! marketing plans entirely offline in a durable local store. Shared
//! read-only template projects can be "edited" through an ephemeral session
//! overlay without ever mutating the shared record. Once an account exists,
//! accumulated offline work is migrated into the authoritative backend in
//! dependency order.
//!
//! The host environment supplies persistent and session-scoped key-value
//! storage ([`storage::KeyValueStorage`]), the backend entity API
//! ([`backend::BackendApi`]) and the authentication state query
//! ([`backend::AuthProvider`]). Everything else lives in [`AppContext`].

pub mod app_context;
pub mod backend;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod reconcile;
pub mod storage;

pub use app_context::AppContext;
