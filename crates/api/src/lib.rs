//! Core-facing interface: request/response mapping, caller context and
//! service wiring.
//!
//! Transport is left to the embedding process. Everything here takes and
//! returns plain serde types so an HTTP, RPC or CLI front end can sit on top.

pub mod app;
pub mod context;

pub use app::LedgerApi;
pub use app::dto::{AdjustRequest, AdjustResponse, LogQuery};
pub use app::errors::{ApiError, ErrorKind};
pub use context::CallerContext;
