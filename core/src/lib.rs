//! # Offerbook Core
//!
//! Data model and consistency engine for the application-outcomes
//! directory. This crate takes one raw snapshot of the four store
//! collections and turns it into the cleaned, annotated dataset the
//! renderers consume: back-references rebuilt, referential integrity
//! enforced by fixed-point pruning, terms resolved and derived statistics
//! attached. It performs no I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregate;
pub mod error;
pub mod integrity;
pub mod links;
pub mod models;
pub mod report;
pub mod terms;

/// Re-export common types for ease of use
pub use error::{CoreError, Result};
pub use integrity::{prune_to_consistency, FilterOutcome, FilterPolicy};
pub use models::{Applicant, Datapoint, Dataset, Major, Program, RawRows, RowId};
pub use terms::{Term, TermBuckets, TermStamp};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the full derivation pipeline on a normalized dataset: rebuild
/// back-references, prune to consistency, resolve latest terms, default
/// nicknames, bucket applicants by term and attach the aggregate views.
///
/// Returns the global term buckets together with what the filter did.
pub fn run_pipeline(
    dataset: &mut Dataset,
    policy: &FilterPolicy,
) -> Result<(TermBuckets, FilterOutcome)> {
    links::rebuild_backrefs(dataset);
    let outcome = integrity::prune_to_consistency(dataset, policy)?;
    terms::set_latest_terms(dataset);
    models::apply_default_nicknames(&mut dataset.applicants);
    let buckets = terms::term_buckets(dataset);
    aggregate::annotate(dataset, &buckets);
    Ok((buckets, outcome))
}
