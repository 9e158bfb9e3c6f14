//! backupctl - ordered backup and restore of application data
//!
//! A fixed, ordered set of tasks is run into a private workdir, stamped with
//! a metadata file and promoted into an archive directory named after the
//! backup id. Restore reads that archive back through the same tasks.

pub mod catalog;
pub mod cli;
pub mod context;
pub mod executor;
pub mod metadata;
pub mod observability;
pub mod output;
pub mod tasks;
