//! Manifest acquisition and parsing.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::download::transient_path;
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::transport::Transport;

/// Columns a manifest must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["CDName", "description", "location"];

/// One row of the sound effects manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestRow {
    /// Grouping field; becomes the sub-directory.
    #[serde(rename = "CDName")]
    pub cd_name: String,
    /// Human-readable description; becomes the file name stem.
    pub description: String,
    /// Remote file name relative to the asset base URL.
    pub location: String,
}

/// Parses manifest rows from CSV text with a header line.
///
/// # Errors
///
/// Returns [`Error::Manifest`] if a required column is missing and
/// [`Error::Csv`] if a record cannot be parsed.
pub fn parse_manifest<R: Read>(reader: R) -> Result<Vec<ManifestRow>> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<_> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::Manifest(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<ManifestRow>, _>>()?;
    Ok(rows)
}

/// Reads and parses the manifest file at `path`.
///
/// # Errors
///
/// Returns [`Error::Manifest`] if the file cannot be opened, or any error
/// from [`parse_manifest`].
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Manifest(format!("cannot open {}: {e}", path.display())))?;
    let rows = parse_manifest(std::io::BufReader::new(file))?;
    log::info!("Read {} manifest rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Makes sure a local copy of the manifest exists.
///
/// If nothing exists at `path`, the manifest is downloaded from `url` into a
/// `.part` file and renamed into place. Returns `true` if a download happened.
///
/// # Errors
///
/// Returns [`Error::Manifest`] if the download or placement fails.
pub async fn ensure_manifest<F, T>(fs: &F, transport: &T, path: &Path, url: &str) -> Result<bool>
where
    F: FileSystem + ?Sized,
    T: Transport + ?Sized,
{
    if fs.file_exists(path).await {
        log::debug!("Using cached manifest {}", path.display());
        return Ok(false);
    }

    log::info!("Fetching manifest from {url}");
    let acquire = async {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs.create_dir_all(parent).await?;
        }
        let pp = transient_path(path);
        let mut file = fs.create_file(&pp).await?;
        let fetched = transport.fetch(url, &mut file).await;
        drop(file);
        if let Err(e) = fetched {
            if let Err(cleanup) = fs.remove_file(&pp).await {
                log::warn!("Could not remove {}: {cleanup}", pp.display());
            }
            return Err(e);
        }
        fs.rename_file(&pp, path).await?;
        Ok::<(), Error>(())
    };

    acquire
        .await
        .map_err(|e| Error::Manifest(format!("failed to fetch {url}: {e}")))?;
    Ok(true)
}
