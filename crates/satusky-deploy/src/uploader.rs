//! Pushes an exported image archive to the platform registry.

use crate::api::PlatformApi;
use crate::error::DeployResult;
use crate::toolchain::{generate_version_token, ImageArchive};

/// Registry the platform serves uploaded images from.
pub const REGISTRY: &str = "registry.satusky.com/satusky-container-registry";

/// Fully qualified reference for an uploaded image.
#[must_use]
pub fn image_reference(project_name: &str, version: &str) -> String {
    format!("{REGISTRY}/{project_name}:{version}")
}

/// Uploads image archives through a [`PlatformApi`].
#[derive(Debug)]
pub struct ImageUploader<'a, P> {
    api: &'a P,
}

impl<'a, P: PlatformApi> ImageUploader<'a, P> {
    /// Creates an uploader.
    #[must_use]
    pub const fn new(api: &'a P) -> Self {
        Self { api }
    }

    /// Uploads `archive` tagged `project_name` under a fresh version token and
    /// returns the image reference to deploy.
    ///
    /// # Errors
    ///
    /// Returns an upload error if the platform does not accept the archive.
    pub async fn upload(&self, archive: &ImageArchive, project_name: &str) -> DeployResult<String> {
        let version = generate_version_token();
        tracing::info!(project = project_name, version = %version, "uploading image");
        self.api
            .upload_image(archive.path(), project_name, &version)
            .await?;
        Ok(image_reference(project_name, &version))
    }
}
