// src/daemon/mod.rs

//! Daemon lifecycle: PID lock, detaching, and the controller tying them
//! together.

pub mod controller;
pub mod detach;
pub mod pidlock;

pub use controller::{DaemonController, Runner, STOP_GRACE};
pub use detach::{DaemonOptions, Detach, Detached, ForkDetach, NoDetach};
pub use pidlock::{process_alive, LockError, LockState, PidLock};
