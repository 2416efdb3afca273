//! [`ContainerToolchain`] backed by the local `docker` and `git` CLIs.

use std::path::Path;

use satusky_validation::{AllowedProgram, SafeCommand};

use super::archive::ImageArchive;
use super::ContainerToolchain;
use crate::error::{DeployError, DeployResult};

/// Platform every image is built for.
pub const BUILD_PLATFORM: &str = "linux/amd64";

/// Builds and exports images with `docker`.
#[derive(Debug, Clone, Default)]
pub struct DockerToolchain;

impl DockerToolchain {
    /// Creates the toolchain.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn path_arg(path: &Path) -> DeployResult<&str> {
    path.to_str().ok_or_else(|| {
        DeployError::preflight(format!("path {} is not valid UTF-8", path.display()))
    })
}

/// Project name from a git remote URL: the last path segment without `.git`.
///
/// Handles both `https://host/org/repo.git` and `git@host:org/repo.git`.
#[must_use]
pub fn project_name_from_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    (!name.is_empty()).then(|| name.to_string())
}

/// Project name from the working directory's base name.
#[must_use]
pub fn project_name_from_dir(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

impl ContainerToolchain for DockerToolchain {
    async fn project_name(&self, working_dir: &Path) -> DeployResult<String> {
        let remote = SafeCommand::new(AllowedProgram::Git)
            .current_dir(path_arg(working_dir)?)
            .args(["config", "--get", "remote.origin.url"])
            .execute_unchecked()
            .await;

        match remote {
            Ok(output) if output.success() => {
                if let Some(name) = project_name_from_remote(&output.stdout_lossy()) {
                    tracing::debug!(project = %name, "project name from git remote");
                    return Ok(name);
                }
            }
            Ok(_) => tracing::debug!("no git origin configured"),
            Err(e) => tracing::debug!(error = %e, "git unavailable"),
        }

        project_name_from_dir(working_dir).ok_or_else(|| {
            DeployError::preflight(format!(
                "cannot derive a project name from {}",
                working_dir.display()
            ))
        })
    }

    async fn build(&self, recipe: &Path, context: &Path, tag: &str) -> DeployResult<()> {
        tracing::info!(recipe = %recipe.display(), tag, "building image");
        SafeCommand::new(AllowedProgram::Docker)
            .args(["build", "--platform", BUILD_PLATFORM, "-f"])
            .arg(path_arg(recipe)?)
            .args(["-t", tag])
            .arg(path_arg(context)?)
            .execute_streaming()
            .await?;
        Ok(())
    }

    async fn export(&self, tag: &str, archive: &ImageArchive) -> DeployResult<()> {
        tracing::info!(tag, archive = %archive.path().display(), "exporting image");
        SafeCommand::new(AllowedProgram::Docker)
            .args(["save", "-o"])
            .arg(path_arg(archive.path())?)
            .arg(tag)
            .execute()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://github.com/acme/demo.git", "demo" ; "https with suffix")]
    #[test_case("https://github.com/acme/demo", "demo" ; "https without suffix")]
    #[test_case("git@github.com:acme/demo.git", "demo" ; "scp style")]
    #[test_case("git@github.com:demo.git", "demo" ; "scp without org")]
    #[test_case("https://gitlab.com/acme/demo/\n", "demo" ; "trailing slash and newline")]
    fn remote_names(url: &str, expected: &str) {
        assert_eq!(project_name_from_remote(url).as_deref(), Some(expected));
    }

    #[test]
    fn empty_remote_has_no_name() {
        assert_eq!(project_name_from_remote(""), None);
        assert_eq!(project_name_from_remote(".git"), None);
    }

    #[test]
    fn dir_name() {
        assert_eq!(
            project_name_from_dir(Path::new("/home/me/my_app")).as_deref(),
            Some("my_app")
        );
        assert_eq!(project_name_from_dir(Path::new("/")), None);
    }
}
