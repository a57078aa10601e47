//! HTTP handlers for the session collection.
//!
//! Both handlers expect [`enforce_privileges`](crate::middleware::enforce_privileges)
//! to have already authorized the request against the target resource.
//!
//! - [`login`]: `POST` on the sessions collection
//! - [`logout`]: `DELETE` on a session resource

pub mod login;
pub mod logout;

pub use login::login_handler;
pub use logout::logout_handler;
