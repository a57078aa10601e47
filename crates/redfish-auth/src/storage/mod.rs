//! Storage traits for auth-related data.
//!
//! Only account and role lookup lives here. Session state is a resource in
//! the main store and is reached through the command bus and tree view.

pub mod account;

pub use account::{Account, AccountStorage, InMemoryAccountStorage, Role, default_roles};
