//! Code issuing service.
//!
//! [`IssuerService`] keeps the local mirror of issued codes in step with a
//! [`eanvault_core::Registry`]: generate, merge, and persist only when the
//! merge added something.

pub mod error;
pub mod service;

pub use error::IssuerError;
pub use service::{ImportMode, ImportOutcome, IssuerService};
