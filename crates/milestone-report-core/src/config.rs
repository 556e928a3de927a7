//! Render configuration.
//!
//! Defaults match a local checkout: template and logo paths are resolved
//! against the working directory and a host-installed browser is used.
//! Deployments override these through environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::browser::{LaunchStrategy, LocalLauncher, PdfOptions, ServerlessLauncher};
use crate::html::template::Interpolation;

pub const DEFAULT_TEMPLATE_PATH: &str = "templates/milestone-report.html";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_TEMPLATE: &str = "MILESTONE_REPORT_TEMPLATE";
pub const ENV_ASSET_ROOT: &str = "MILESTONE_REPORT_ASSET_ROOT";
pub const ENV_SERVERLESS: &str = "MILESTONE_REPORT_SERVERLESS";
pub const ENV_TIMEOUT_SECS: &str = "MILESTONE_REPORT_TIMEOUT_SECS";
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_EXECUTABLE_PATH";
pub const ENV_CHROMIUM_PACK_URL: &str = "CHROMIUM_PACK_URL";

/// Platform variables whose presence marks a serverless runtime.
const SERVERLESS_MARKERS: [&str; 2] = ["AWS_LAMBDA_FUNCTION_NAME", "VERCEL"];

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub template_path: PathBuf,
    /// Directory the logo candidates are resolved against.
    pub asset_root: PathBuf,
    pub serverless: bool,
    pub chromium_path: Option<PathBuf>,
    pub chromium_pack_url: Option<String>,
    pub timeout: Duration,
    pub interpolation: Interpolation,
    pub pdf: PdfOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            asset_root: PathBuf::from("."),
            serverless: false,
            chromium_path: None,
            chromium_pack_url: None,
            timeout: DEFAULT_TIMEOUT,
            interpolation: Interpolation::default(),
            pdf: PdfOptions::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_TEMPLATE) {
            config.template_path = PathBuf::from(path);
        }
        if let Some(root) = get(ENV_ASSET_ROOT) {
            config.asset_root = PathBuf::from(root);
        }

        config.serverless = match get(ENV_SERVERLESS) {
            Some(flag) => parse_flag(&flag),
            None => SERVERLESS_MARKERS.iter().any(|&key| get(key).is_some()),
        };

        config.chromium_path = get(ENV_CHROMIUM_PATH).map(PathBuf::from);
        config.chromium_pack_url = get(ENV_CHROMIUM_PACK_URL);

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            match parse_timeout_secs(&raw) {
                Some(timeout) => config.timeout = timeout,
                None => warn!(
                    value = %raw,
                    "ignoring {ENV_TIMEOUT_SECS}: expected a positive number of seconds"
                ),
            }
        }

        config
    }

    /// Launch strategy selected by the `serverless` flag.
    pub fn launch_strategy(&self) -> LaunchStrategy {
        if self.serverless {
            LaunchStrategy::Serverless(ServerlessLauncher::new(
                self.chromium_path.clone(),
                self.chromium_pack_url.clone(),
            ))
        } else {
            LaunchStrategy::Local(LocalLauncher::new(self.chromium_path.clone()))
        }
    }
}

/// Whole seconds, at least one.
fn parse_timeout_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
