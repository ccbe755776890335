//! valwatch - watch one numeric value on a web page and log every change
//!
//! Fetches a page on a fixed cadence, pins the target value down with a
//! structural locator, and appends each classified change to an
//! append-only audit log.

pub mod audit;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod monitor;
pub mod page;
pub mod value;

pub use config::{Config, FetchEngine};
pub use monitor::models::{ChangeEvent, ChangeKind, ObservedState, TargetSpec};
pub use page::{Locator, PathStep};
