//! # Offerbook Render
//!
//! The presentation side of the pipeline: renders the cleaned, annotated
//! dataset into a static MkDocs site or a LaTeX book, and installs static
//! resources next to the generated pages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod escape;
pub mod latex;
pub mod mkdocs;
pub mod resources;

pub use latex::LatexRenderer;
pub use mkdocs::MkDocsRenderer;
pub use resources::install_resources;

use std::fs;
use std::path::Path;

use chrono::{FixedOffset, Utc};
use thiserror::Error;

/// Render error type
#[derive(Error, Debug)]
pub enum RenderError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest parse error
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A resource named by the manifest does not exist
    #[error("Resource {0} does not exist")]
    MissingResource(String),

    /// Symlink installation requested on a platform without symlinks
    #[error("symlink installation is not supported on this platform")]
    SymlinkUnsupported,
}

/// Write one page, creating parent directories as needed.
pub(crate) fn write_page(path: &Path, content: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// The maintainers' timezone for the generated-at stamp.
const BUILD_TZ_OFFSET_SECS: i32 = 8 * 3600;

fn build_tz() -> Option<FixedOffset> {
    FixedOffset::east_opt(BUILD_TZ_OFFSET_SECS)
}

/// Build timestamp, minute precision.
pub(crate) fn build_stamp() -> String {
    match build_tz() {
        Some(tz) => Utc::now().with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
        None => Utc::now().format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Build date, day precision.
pub(crate) fn build_date() -> String {
    match build_tz() {
        Some(tz) => Utc::now().with_timezone(&tz).format("%Y-%m-%d").to_string(),
        None => Utc::now().format("%Y-%m-%d").to_string(),
    }
}
