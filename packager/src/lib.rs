//! uepack packager library.
//!
//! This crate turns an Unreal project template directory into one
//! distributable zip archive per engine version. It is used by the `uepack`
//! CLI binary and can be embedded by other front ends, which drive a build
//! through [`worker::BuildWorker`] or call [`pipeline::run_build`] directly.
//!
//! # Modules
//!
//! - [`archive`] - Base archive creation and manifest patching
//! - [`catalog`] - Engine version catalog and target selections
//! - [`cli`] - Command-line argument definitions and build resolution
//! - [`error`] - Semantic error types
//! - [`events`] - Build observers and cooperative cancellation
//! - [`exclude`] - Top-level names left out of archives
//! - [`manifest`] - `.uproject` discovery and mutation
//! - [`naming`] - Version labels and archive file names
//! - [`output`] - CLI output formatting
//! - [`pipeline`] - Build orchestration
//! - [`profile`] - Saved build profiles
//! - [`tool`] - 7-Zip discovery and invocation
//! - [`worker`] - Background build execution

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod events;
pub mod exclude;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod tool;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
