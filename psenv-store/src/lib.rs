//! # psenv-store
//!
//! Remote parameter store client.
//!
//! [`ParameterStore`] is the contract the sync engine consumes: paginated
//! fetch-by-path, put-many and delete-many. Backends:
//! - [`SsmStore`]: AWS Systems Manager Parameter Store (feature `ssm`)
//! - [`FileStore`]: a JSON document on local disk
//! - [`MemoryStore`]: in-process, with failure injection for tests

pub mod client;
pub mod error;
pub mod file;
pub mod memory;
#[cfg(feature = "ssm")]
pub mod ssm;

pub use client::{Page, PageRequest, ParameterStore, QualifiedParams};
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "ssm")]
pub use ssm::{SsmConfig, SsmStore};
