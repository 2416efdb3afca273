//! Scoped temporary tar file for an exported image.

use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::DeployResult;

/// A temporary `.tar` that is deleted when dropped, on every exit path.
#[derive(Debug)]
pub struct ImageArchive {
    file: NamedTempFile,
}

impl ImageArchive {
    /// Reserves a uniquely named tar file in the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(project_name: &str) -> DeployResult<Self> {
        Self::create_in(&std::env::temp_dir(), project_name)
    }

    /// Reserves a uniquely named tar file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create_in(dir: &Path, project_name: &str) -> DeployResult<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}-", archive_stem(project_name)))
            .suffix(".tar")
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    /// Path of the tar file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Base name of the tar file, used as the multipart file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// File-name-safe form of a project name.
#[must_use]
pub fn archive_stem(project_name: &str) -> String {
    project_name.replace(['/', '\\'], "_")
}
