//! Step execution: run a command and record the link around it.
//!
//! `run_step` hashes the material paths, executes the command capturing
//! stdout, stderr, and the exit status as byproducts, then hashes the
//! product paths. The result is an unsigned [`Metablock`] ready for
//! signing and translation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::LinkError;
use crate::link::{ArtifactHashes, Link};
use crate::metablock::Metablock;

/// Run a supply-chain step and produce its link record.
///
/// `material_paths` and `product_paths` are files or directories; directories
/// are walked recursively. Paths are recorded relative to the current working
/// directory where possible. An empty `command` records artifacts only, for
/// steps performed out of band.
///
/// # Errors
///
/// Returns [`LinkError::CommandFailed`] if the command cannot be spawned,
/// or [`LinkError::Io`] if an artifact cannot be read.
pub fn run_step(
    name: &str,
    material_paths: &[PathBuf],
    product_paths: &[PathBuf],
    command: &[String],
) -> Result<Metablock, LinkError> {
    let mut link = Link::new(name);
    link.materials = record_artifacts(material_paths)?;
    link.command = command.to_vec();

    if let Some((program, args)) = command.split_first() {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| LinkError::CommandFailed {
                command: command.join(" "),
                source,
            })?;

        link.byproducts.return_value = Some(i64::from(output.status.code().unwrap_or(-1)));
        link.byproducts.stdout = Some(String::from_utf8_lossy(&output.stdout).into_owned());
        link.byproducts.stderr = Some(String::from_utf8_lossy(&output.stderr).into_owned());

        debug!(
            step = name,
            return_value = ?output.status.code(),
            "step command finished"
        );
    }

    link.products = record_artifacts(product_paths)?;

    if let Ok(cwd) = std::env::current_dir() {
        link.environment
            .insert("workdir".to_owned(), cwd.display().to_string());
    }

    Ok(Metablock::new(link))
}

/// Hash every file reachable from the given paths.
///
/// Returns a map from relative path to its hash set. Each entry carries a
/// single `sha256` digest.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if a path cannot be read.
pub fn record_artifacts(
    paths: &[PathBuf],
) -> Result<BTreeMap<String, ArtifactHashes>, LinkError> {
    let mut artifacts = BTreeMap::new();
    for path in paths {
        collect_files(path, &mut artifacts)?;
    }
    Ok(artifacts)
}

fn collect_files(
    path: &Path,
    artifacts: &mut BTreeMap<String, ArtifactHashes>,
) -> Result<(), LinkError> {
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            collect_files(&entry.path(), artifacts)?;
        }
        return Ok(());
    }

    let digest = sha256_file(path)?;
    let key = normalize_path(path);
    artifacts.insert(
        key,
        BTreeMap::from([("sha256".to_owned(), digest)]),
    );
    Ok(())
}

/// Compute the SHA-256 hex digest of a file.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String, LinkError> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Record a path relative to the working directory, stripping a leading `./`.
fn normalize_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf));
    let display = relative.as_deref().unwrap_or(path).display().to_string();
    display.strip_prefix("./").map_or(display.clone(), str::to_owned)
}
