use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::browser::{BrowserLauncher, ChromiumBrowser};
use crate::error::{RenderError, Result};

/// Browser binaries searched on `PATH`, in order.
pub const BROWSER_NAMES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Install locations checked when nothing is found on `PATH`.
const WELL_KNOWN_LOCATIONS: [&str; 5] = [
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/snap/bin/chromium",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

const LOCAL_ARGS: [&str; 3] = ["--headless", "--no-sandbox", "--disable-setuid-sandbox"];

/// Launches a full browser installed on the host (development machines).
#[derive(Debug, Clone, Default)]
pub struct LocalLauncher {
    executable: Option<PathBuf>,
}

impl LocalLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    /// Explicit executable, else the first browser found on the host.
    pub fn resolve_executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }
        discover().ok_or_else(|| {
            RenderError::ExecutableNotFound(format!(
                "none of {} on PATH or in standard install locations",
                BROWSER_NAMES.join(", ")
            ))
        })
    }

    pub fn args() -> Vec<String> {
        LOCAL_ARGS.iter().map(|s| s.to_string()).collect()
    }
}

impl BrowserLauncher for LocalLauncher {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> Result<ChromiumBrowser> {
        let executable = self.resolve_executable()?;
        info!(strategy = "local", executable = %executable.display(), "launching browser");
        ChromiumBrowser::start(executable, Self::args()).await
    }
}

/// Find an installed Chromium-family browser.
pub fn discover() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_in_path(&path_var, &BROWSER_NAMES).or_else(|| {
        WELL_KNOWN_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
    })
}

/// First `names` entry that exists as a file in one of the `path_var` dirs.
pub fn find_in_path(path_var: &OsStr, names: &[&str]) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
    for name in names {
        for dir in &dirs {
            let candidate = executable_in(dir, name);
            if candidate.is_file() {
                debug!(candidate = %candidate.display(), "found browser on PATH");
                return Some(candidate);
            }
        }
    }
    None
}

fn executable_in(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}
