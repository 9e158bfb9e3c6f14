//! Backup and restore executors
//!
//! Both executors drive the task registry strictly in registration order on
//! the calling thread. Asynchronous tasks hand off their work and return;
//! when `wait_for_completion` is set, they are awaited one after another
//! once every task has been dispatched.
//!
//! # Usage
//!
//! ```ignore
//! let mut executor = BackupExecutor::new(&context, &registry, options, &output)?;
//! let result = executor.execute();
//! executor.release()?;
//! let report = result?;
//! ```
//!
//! `release` is never implicit: a failed run keeps its workdir for
//! post-mortem inspection until the caller releases it.

mod backup;
mod base;
mod errors;
mod report;
mod restore;
mod workdir;

pub use backup::BackupExecutor;
pub use base::{BaseExecutor, ExecutorOptions};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use report::{Direction, RunReport, TaskReport};
pub use restore::RestoreExecutor;
pub use workdir::{is_plain_name, is_scratch_name, PARTIAL_SUFFIX, WORKDIR_PREFIX};
