//! # Offerbook Client
//!
//! The Record Store side of the pipeline: fetches the four collections
//! from the remote tabular base, caches raw snapshots on disk, and rewrites
//! workspace image URLs in applicant summaries to direct links.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod cache;
pub mod images;

pub use api::{ClientConfig, ClientError, RawTables, Result, StoreClient, TableNames};
pub use cache::SnapshotCache;
