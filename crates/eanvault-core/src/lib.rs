//! Core types and traits for eanvault.
//!
//! This crate provides the EAN-13 code model, digit masks, the set of
//! already-issued codes, and the [`Registry`] contract shared by the
//! generator, the storage backends and the issuer service.

pub mod code;
pub mod error;
pub mod mask;
pub mod registry;
pub mod used_codes;

pub use code::{checksum, Ean13, BODY_LEN, CODE_LEN};
pub use error::{CoreError, RegistryError};
pub use mask::{Mask, WILDCARD};
pub use registry::{CodeList, CodeListSummary, Registry};
pub use used_codes::{merge, UsedCodes};
