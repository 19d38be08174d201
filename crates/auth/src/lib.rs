//! `hubledger-auth`: access policy boundary for the ledger.
//!
//! Authentication happens elsewhere: callers hand in an already-resolved
//! [`Principal`]. This crate only decides whether that principal may act on a
//! hub. It is intentionally decoupled from transport and storage.

pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use permissions::Permission;
pub use policy::{AccessPolicy, AllowAll, AuthzError, RolePolicy};
pub use principal::Principal;
pub use roles::Role;
