//! Local image toolchain: recipe handling, build, export and version tokens.

pub mod archive;
pub mod docker;
pub mod recipe;

use std::future::Future;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{DeployError, DeployResult};

pub use archive::ImageArchive;
pub use docker::DockerToolchain;
pub use recipe::{build_context, discover_recipe, validate_recipe, validate_recipe_file};

/// Longest image name component the registry accepts.
pub const MAX_IMAGE_NAME_LENGTH: usize = 128;

/// Random bytes in a version token.
pub const VERSION_TOKEN_BYTES: usize = 5;

/// Builds and exports container images.
///
/// This trait allows for testing with fake implementations.
pub trait ContainerToolchain: Send + Sync {
    /// Derives the project name for `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if no name can be derived.
    fn project_name(&self, working_dir: &Path) -> impl Future<Output = DeployResult<String>> + Send;

    /// Builds `recipe` in `context`, tagging the image `tag`.
    ///
    /// # Errors
    ///
    /// Returns a toolchain error if the build tool is missing or fails.
    fn build(
        &self,
        recipe: &Path,
        context: &Path,
        tag: &str,
    ) -> impl Future<Output = DeployResult<()>> + Send;

    /// Writes image `tag` into `archive`.
    ///
    /// # Errors
    ///
    /// Returns a toolchain error if the export fails.
    fn export(
        &self,
        tag: &str,
        archive: &ImageArchive,
    ) -> impl Future<Output = DeployResult<()>> + Send;
}

/// Generates a version token: 5 bytes from the OS RNG as 10 lowercase hex
/// characters.
#[must_use]
pub fn generate_version_token() -> String {
    let mut bytes = [0u8; VERSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks that a project name can be used as an image tag.
///
/// The name is kept as derived; one that the build tool would refuse is
/// reported here instead of as a failed build.
///
/// # Errors
///
/// Returns a preflight error naming the project and what is wrong with it.
pub fn check_image_name(project_name: &str) -> DeployResult<()> {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-');
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();

    let problem = if project_name.is_empty() {
        Some("it is empty".to_string())
    } else if project_name.len() > MAX_IMAGE_NAME_LENGTH {
        Some(format!("it is longer than {MAX_IMAGE_NAME_LENGTH} characters"))
    } else if let Some(c) = project_name.chars().find(|c| !allowed(*c)) {
        if c.is_ascii_uppercase() {
            Some("image names must be lowercase".to_string())
        } else {
            Some(format!("character {c:?} is not allowed"))
        }
    } else if !project_name.starts_with(alnum) || !project_name.ends_with(alnum) {
        Some("it must start and end with a letter or digit".to_string())
    } else {
        None
    };

    match problem {
        None => Ok(()),
        Some(reason) => Err(DeployError::preflight(format!(
            "project name '{project_name}' cannot be used as an image name: {reason}; \
             rename the repository or directory"
        ))),
    }
}
