//! Domain types shared by every taskrelay crate.
//!
//! Holds the [`task::Task`] value that flows through the pipeline, its
//! lifecycle [`status::TaskStatus`], the domain [`error::CoreError`], and
//! the OS signal future both binaries use for graceful shutdown.

pub mod error;
pub mod shutdown;
pub mod status;
pub mod task;
pub mod types;
