//! vcpkg-registry library crate.
//!
//! The primary interface is the `vcpkg-registry` binary. This lib.rs exposes
//! the ledger, the port-file writers, and the command layer so integration
//! tests can drive them against a real git repository with a fake metadata
//! source.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod github;
pub mod json_file;
pub mod layout;
pub mod ledger;
pub mod manifest;
pub mod model;
pub mod portfile;
pub mod telemetry;
