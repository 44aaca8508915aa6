// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`template`] renders command templates with shell-quoted values.
//! - [`backend`] provides the `ExecutorBackend` trait the delivery tasks
//!   call; [`executor`] is the real implementation.
//! - [`command`] spawns processes with merged, captured output.
//! - [`supervisor`] owns the table of background children and the loop
//!   reaping them.
//! - [`report`] runs post actions and logs outcomes; [`decode`] turns
//!   captured bytes into text for them.

pub mod backend;
pub mod command;
pub mod decode;
pub mod executor;
pub mod report;
pub mod supervisor;
pub mod template;

pub use backend::{ExecError, ExecutorBackend};
pub use executor::ProcessExecutor;
pub use report::StatusReporter;
pub use supervisor::{spawn_supervisor, ChildTable, SupervisorHandle};
