//! Build recipe (Dockerfile) discovery and validation.

use std::fs;
use std::path::{Path, PathBuf};

use satusky_validation::{is_valid_stage_name, validate_image_reference};

use crate::error::{DeployError, DeployResult};

/// Locations checked, in order, relative to the search directory.
pub const RECIPE_CANDIDATES: &[&str] = &[
    "Dockerfile",
    "dockerfile",
    "docker/Dockerfile",
    ".docker/Dockerfile",
    "build/Dockerfile",
    ".build/Dockerfile",
];

/// Instructions the validator accepts.
pub const KNOWN_INSTRUCTIONS: &[&str] = &[
    "FROM",
    "RUN",
    "CMD",
    "LABEL",
    "EXPOSE",
    "ENV",
    "ADD",
    "COPY",
    "ENTRYPOINT",
    "VOLUME",
    "USER",
    "WORKDIR",
    "ARG",
    "ONBUILD",
    "STOPSIGNAL",
    "HEALTHCHECK",
    "SHELL",
];

/// One instruction after continuation lines have been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based line number where the instruction starts.
    pub number: usize,
    /// Joined instruction text.
    pub text: String,
}

/// Joins `\`-continued lines and drops blanks and comments.
#[must_use]
pub fn logical_lines(contents: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (index, raw) in contents.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.starts_with('#') || (trimmed.is_empty() && pending.is_none()) {
            continue;
        }

        let (body, continues) = match trimmed.strip_suffix('\\') {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };

        let line = match pending.take() {
            Some(mut open) => {
                if !body.is_empty() {
                    open.text.push(' ');
                    open.text.push_str(body);
                }
                open
            }
            None => LogicalLine {
                number: index + 1,
                text: body.to_string(),
            },
        };

        if continues {
            pending = Some(line);
        } else if !line.text.is_empty() {
            lines.push(line);
        }
    }

    if let Some(open) = pending.filter(|l| !l.text.is_empty()) {
        lines.push(open);
    }
    lines
}

fn check_from(args: &[&str]) -> Result<(), String> {
    let (image, stage) = match args {
        [image] => (*image, None),
        [image, keyword, stage] if keyword.eq_ignore_ascii_case("AS") => (*image, Some(*stage)),
        [] => return Err("FROM requires an image".to_string()),
        _ => {
            return Err(format!(
                "FROM must be 'FROM <image>' or 'FROM <image> AS <stage>', got 'FROM {}'",
                args.join(" ")
            ));
        }
    };

    if let Err(e) = validate_image_reference(image) {
        return Err(e.kind.to_string());
    }
    if let Some(stage) = stage {
        if !is_valid_stage_name(stage) {
            return Err(format!("invalid stage name '{stage}'"));
        }
    }
    Ok(())
}

/// Validates recipe text, returning every problem found.
///
/// # Errors
///
/// Returns one message per rejected line, prefixed with its line number.
pub fn validate_recipe(contents: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut saw_from = false;

    for (position, line) in logical_lines(contents).iter().enumerate() {
        let tokens: Vec<&str> = line.text.split_whitespace().collect();
        let Some((first, args)) = tokens.split_first() else {
            continue;
        };
        let instruction = first.to_uppercase();

        if !KNOWN_INSTRUCTIONS.contains(&instruction.as_str()) {
            errors.push(format!("line {}: unknown instruction '{first}'", line.number));
            continue;
        }
        if position == 0 && instruction != "FROM" && instruction != "ARG" {
            errors.push(format!(
                "line {}: first instruction must be FROM or ARG, got {instruction}",
                line.number
            ));
        }
        if instruction == "FROM" {
            saw_from = true;
            if let Err(e) = check_from(args) {
                errors.push(format!("line {}: {e}", line.number));
            }
        }
    }

    if !saw_from {
        errors.push("no FROM instruction found".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Reads and validates the recipe at `path`.
///
/// # Errors
///
/// Returns [`DeployError::InvalidRecipe`] listing every rejected line, or an
/// I/O error if the file cannot be read.
pub fn validate_recipe_file(path: &Path) -> DeployResult<()> {
    let contents = fs::read_to_string(path)?;
    validate_recipe(&contents).map_err(|errors| DeployError::InvalidRecipe {
        path: path.to_path_buf(),
        errors,
    })
}

/// Finds the build recipe to use.
///
/// An explicit file is validated and used as is. An explicit directory, or
/// an explicit file that does not exist, falls back to searching
/// [`RECIPE_CANDIDATES`] in that directory. Without an explicit path the
/// search runs in `working_dir`.
///
/// # Errors
///
/// Returns [`DeployError::InvalidRecipe`] when the only recipe found is
/// invalid, or [`DeployError::NoRecipe`] when none exists.
pub fn discover_recipe(working_dir: &Path, explicit: Option<&Path>) -> DeployResult<PathBuf> {
    let search_dir = match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                working_dir.join(path)
            };
            if path.is_file() {
                validate_recipe_file(&path)?;
                return Ok(path);
            }
            if path.is_dir() {
                path
            } else {
                tracing::debug!(path = %path.display(), "recipe not found, searching its directory");
                path.parent().map_or_else(|| working_dir.to_path_buf(), Path::to_path_buf)
            }
        }
        None => working_dir.to_path_buf(),
    };

    let mut first_invalid = None;
    for candidate in RECIPE_CANDIDATES {
        let path = search_dir.join(candidate);
        if !path.is_file() {
            continue;
        }
        match validate_recipe_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "using recipe");
                return Ok(path);
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping invalid recipe");
                if first_invalid.is_none() {
                    first_invalid = Some(e);
                }
            }
        }
    }

    Err(first_invalid.unwrap_or_else(|| DeployError::NoRecipe { dir: search_dir }))
}

/// Directory used as the build context for a recipe.
///
/// When `--dockerfile` was given, the build runs from the directory holding
/// the recipe that was finally used, whether it named the file, its directory,
/// or a missing file whose directory was searched. Otherwise the build runs
/// from the working directory.
#[must_use]
pub fn build_context(recipe: &Path, explicit: bool, working_dir: &Path) -> PathBuf {
    if explicit {
        recipe.parent().unwrap_or(working_dir).to_path_buf()
    } else {
        working_dir.to_path_buf()
    }
}
