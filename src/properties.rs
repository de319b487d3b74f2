//! The flat `key=value` file whose `version` entry carries the release version.

use crate::error::{GardenerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const VERSION_KEY: &str = "version";

/// Locates `name` directly inside `dir`; nested files are not considered.
pub fn find_properties_file(dir: &Path, name: &str) -> Result<PathBuf> {
    info!("Looking for '{}' at '{}'", name, dir.display());
    let candidate = dir.join(name);

    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(GardenerError::PropertiesFileNotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

/// Splits a properties line into its key and the byte offset of its value.
///
/// Returns `None` for blanks, comments and lines without a key.
fn split_entry(line: &str) -> Option<(&str, usize)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }
    let indent = line.len() - trimmed.len();

    let key_end = trimmed
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(trimmed.len());
    let key = &trimmed[..key_end];

    // Skip padding, at most one `=`/`:`, then padding again
    let rest = &trimmed[key_end..];
    let after_pad = rest.trim_start_matches([' ', '\t']);
    let after_sep = after_pad
        .strip_prefix(['=', ':'])
        .unwrap_or(after_pad)
        .trim_start_matches([' ', '\t']);

    let value_start = indent + key_end + (rest.len() - after_sep.len());
    Some((key, value_start))
}

/// Replaces the value of the `version` key, leaving every other byte alone.
///
/// # Returns
/// * `Ok(true)` - the file was rewritten
/// * `Ok(false)` - no `version` key, file untouched
pub fn update_version_in_file(path: &Path, version: &str) -> Result<bool> {
    info!("Updating file {} to version {}", path.display(), version);
    let content = fs::read_to_string(path)?;

    let mut updated = String::with_capacity(content.len() + version.len());
    let mut found = false;

    for line in content.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];

        match split_entry(body) {
            Some((key, value_start)) if key == VERSION_KEY => {
                updated.push_str(&body[..value_start]);
                updated.push_str(version);
                updated.push_str(ending);
                found = true;
            }
            _ => updated.push_str(line),
        }
    }

    if !found {
        info!("There is no 'version' property in '{}', skipping", path.display());
        return Ok(false);
    }

    fs::write(path, updated)?;
    Ok(true)
}
