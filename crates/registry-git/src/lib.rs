//! Git layer for vcpkg-registry.
//!
//! This crate defines the [`GitRepo`] trait: the only interface through
//! which the registry tool touches version control. The ledger asks it for
//! content-tree hashes; the command layer asks it to stage and commit.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`],
//!   [`ExecutionMode`]).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod repo;
pub mod types;

mod cli_impl;
mod gix_repo;
mod tree_impl;

pub use gix_repo::GixRepo;

pub use error::GitError;
pub use repo::GitRepo;
pub use types::{ExecutionMode, GitOid, OidParseError};
