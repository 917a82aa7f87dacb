use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::browser::driver::{ElementRef, Locator, WebDriver};
use crate::error::ReplayError;

const OPTION_SELECTOR: &str = "option";
const ROLE_OPTION_SELECTOR: &str = "[role=\"option\"]";

/// Pick the option whose text or value equals `value` exactly.
///
/// A native `<select>` is searched through its `option` children. Anything
/// else is treated as a custom dropdown: it is clicked open and the first
/// `[role="option"]` in the document with matching text is clicked.
pub fn select_option<D: WebDriver + ?Sized>(
    driver: &mut D,
    select: &ElementRef,
    value: &str,
    locator: &Locator,
) -> Result<(), ReplayError> {
    let not_found = || ReplayError::OptionNotFound {
        locator: locator.to_string(),
        value: value.to_string(),
    };

    let options = driver.find_elements_from(select, &Locator::Css(OPTION_SELECTOR.into()))?;
    if !options.is_empty() {
        for option in &options {
            let text_matches = driver.text(option)?.trim() == value;
            if text_matches || driver.attribute(option, "value")?.as_deref() == Some(value) {
                driver.click(option)?;
                return Ok(());
            }
        }
        return Err(not_found());
    }

    driver.click(select)?;
    for option in driver.find_elements(&Locator::Css(ROLE_OPTION_SELECTOR.into()))? {
        if driver.text(&option)?.trim() == value {
            driver.click(&option)?;
            return Ok(());
        }
    }
    Err(not_found())
}

/// A captured element screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    pub event_id: String,
    pub path: PathBuf,
    /// Hex SHA-1 of the PNG bytes.
    pub sha1: String,
}

/// Write PNG bytes to `<dir>/<name>.png` and describe the artifact.
pub fn write_screenshot(
    dir: &Path,
    name: &str,
    event_id: &str,
    png: &[u8],
) -> Result<ScreenshotArtifact, ReplayError> {
    let path = dir.join(format!("{}.png", sanitize_filename(name)));
    let artifact_error = |source| ReplayError::Artifact {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(artifact_error)?;
    std::fs::write(&path, png).map_err(artifact_error)?;

    let mut hasher = Sha1::new();
    hasher.update(png);

    Ok(ScreenshotArtifact {
        event_id: event_id.to_string(),
        path: path.clone(),
        sha1: format!("{:x}", hasher.finalize()),
    })
}

/// Sanitize an artifact name into a safe filename.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "screenshot".to_string()
    } else {
        cleaned
    }
}
