//! # DataStore Module
//!
//! Domain types shared by the digest pipeline and the storage layer for the
//! intermediate artifacts a run produces: transcripts, summaries and rendered
//! reports.
//!
//! Artifacts are kept on the local filesystem so that later stages can be
//! re-run against data cached by an earlier run.

mod datastore;
mod domain;

pub use datastore::fs::FsDataStore;
pub use datastore::{sanitize_filename, DataStore};
pub use domain::{Channel, Transcript, VideoTask};
