//! Registry backends for the issued-codes list.
//!
//! [`InMemoryRegistry`] and [`FileRegistry`] share the versioned
//! [`document::RegistryDocument`] model; [`MySqlRegistry`] stores one row per
//! version in the `code_lists` table (see `ddl/mysql/code_lists.sql`).

pub mod document;
pub mod file;
pub mod memory;
pub mod mysql;

pub use eanvault_core::registry::{CodeList, CodeListSummary, Registry, Result};
pub use eanvault_core::RegistryError;
pub use file::FileRegistry;
pub use memory::InMemoryRegistry;
pub use mysql::MySqlRegistry;
