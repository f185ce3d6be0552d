//! Partial-file lifecycle.
//!
//! Each successfully fetched chunk lives in its own partial file,
//! `<scratch_dir>/<name>.progress.<index>`, until the whole object has been
//! verified and reassembled. Partial files survive crashes and failed runs;
//! they are deleted only after the output file is in place.

use super::plan::DownloadPlan;
use crate::error::{Error, Result};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

/// Writes `bytes` to `path` through a sibling temporary file and a rename, so
/// a crash never leaves a truncated file under the final name. The temporary
/// file is removed when any step fails.
pub async fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = with_suffix(path, ".tmp");
    let result = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        Ok::<_, Error>(())
    }
    .await;
    if result.is_err() {
        discard(&tmp).await;
    }
    result
}

/// Best-effort removal of a leftover temporary file.
async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed leftover {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove leftover {:?}: {}", path, e),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Scratch location holding the partial files of one download.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    dir: PathBuf,
    name: OsString,
}

impl ScratchSpace {
    /// Partial files for `output` are named after its final path component.
    pub fn new(dir: impl Into<PathBuf>, output: &Path) -> Result<Self> {
        let name = output.file_name().ok_or_else(|| {
            Error::InvalidConfig(format!(
                "output path {} has no file name",
                output.display()
            ))
        })?;
        Ok(Self {
            dir: dir.into(),
            name: name.to_owned(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the partial file holding chunk `index`.
    pub fn partial_path(&self, index: usize) -> PathBuf {
        let mut name = self.name.clone();
        name.push(format!(".progress.{}", index));
        self.dir.join(name)
    }

    /// Creates the scratch directory if needed.
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Checks that every partial file of `plan` exists with its exact length.
    ///
    /// Every problem is logged; the first one is returned.
    pub async fn verify(&self, plan: &DownloadPlan) -> Result<()> {
        let mut first_problem = None;
        for (index, range) in plan.iter() {
            let path = self.partial_path(index);
            let found = fs::metadata(&path).await.ok().map(|m| m.len());
            if found != Some(range.len()) {
                warn!(
                    "Progress file {:?} is missing or has incorrect size: expected {}, found {:?}",
                    path,
                    range.len(),
                    found
                );
                first_problem.get_or_insert(Error::Verification {
                    path,
                    expected: range.len(),
                    found,
                });
            }
        }
        match first_problem {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Concatenates the partial files of `plan`, in order, into `output`.
    ///
    /// The data is first written to `<output>.assembling` and renamed once
    /// complete; on failure that file is removed. Partial files are left
    /// untouched. Returns the number of bytes written.
    pub async fn assemble(&self, plan: &DownloadPlan, output: &Path) -> Result<u64> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            debug!("Creating destination directory {:?}", parent);
            fs::create_dir_all(parent).await?;
        }

        let assembling = with_suffix(output, ".assembling");
        debug!("Assembling {} chunks into {:?}", plan.len(), &assembling);
        let result = async {
            let written = self.concatenate(plan, &assembling).await?;
            if written != plan.total_size() {
                return Err(Error::Internal(format!(
                    "assembled {} bytes, expected {}",
                    written,
                    plan.total_size()
                )));
            }
            fs::rename(&assembling, output).await?;
            Ok(written)
        }
        .await;
        if result.is_err() {
            discard(&assembling).await;
        }
        result
    }

    async fn concatenate(&self, plan: &DownloadPlan, target: &Path) -> Result<u64> {
        let mut file = fs::File::create(target).await?;
        let mut written = 0;
        for (index, _) in plan.iter() {
            let mut partial = fs::File::open(self.partial_path(index)).await?;
            written += tokio::io::copy(&mut partial, &mut file).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }

    /// Deletes the partial files of `plan`. Failures are logged and counted.
    pub async fn cleanup(&self, plan: &DownloadPlan) -> usize {
        let mut failures = 0;
        for (index, _) in plan.iter() {
            let path = self.partial_path(index);
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to remove progress file {:?}: {}", path, e);
                failures += 1;
            }
        }
        failures
    }
}
