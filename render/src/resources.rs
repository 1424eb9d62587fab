//! Static resource installation
//!
//! A resource directory carries a `manifest.json` mapping source paths
//! (relative to the resource directory) to destination paths (relative to
//! the output directory). Sources are copied by default; `link` replaces
//! the copy with a symlink so a live `mkdocs serve` picks up edits.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::RenderError;

#[derive(Debug, Deserialize)]
struct Manifest {
    mappings: BTreeMap<String, String>,
}

/// Install every resource named by `resource_dir/manifest.json` into
/// `output_dir`.
pub fn install_resources(
    resource_dir: &Path,
    output_dir: &Path,
    link: bool,
) -> Result<(), RenderError> {
    let manifest_text = fs::read_to_string(resource_dir.join("manifest.json"))?;
    let manifest: Manifest = serde_json::from_str(&manifest_text)?;

    for (src, dest) in &manifest.mappings {
        let src_path = resource_dir.join(src);
        let dest_path = output_dir.join(dest);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if link {
            install_symlink(&src_path, &dest_path)?;
        } else if src_path.is_file() {
            fs::copy(&src_path, &dest_path)?;
        } else if src_path.is_dir() {
            copy_tree(&src_path, &dest_path)?;
        } else {
            return Err(RenderError::MissingResource(src.clone()));
        }
        debug!("installed resource {} -> {}", src, dest);
    }

    Ok(())
}

#[cfg(unix)]
fn install_symlink(src: &Path, dest: &Path) -> Result<(), RenderError> {
    if !src.exists() {
        return Err(RenderError::MissingResource(src.display().to_string()));
    }
    if dest.symlink_metadata().is_ok() {
        if dest.is_dir() && !dest.symlink_metadata()?.file_type().is_symlink() {
            fs::remove_dir_all(dest)?;
        } else {
            fs::remove_file(dest)?;
        }
    }
    std::os::unix::fs::symlink(src, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn install_symlink(_src: &Path, _dest: &Path) -> Result<(), RenderError> {
    Err(RenderError::SymlinkUnsupported)
}

fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
