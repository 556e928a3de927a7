use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::browser::{BrowserLauncher, ChromiumBrowser};
use crate::error::{RenderError, Result};

/// Flags required to run Chromium inside a constrained serverless sandbox.
pub const SERVERLESS_ARGS: [&str; 8] = [
    "--headless",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-features=HttpsUpgrades",
    "--single-process",
    "--no-zygote",
    "--disable-gpu",
];

/// File names accepted as the browser binary inside an extracted pack.
const PACK_BINARY_NAMES: [&str; 3] = ["chromium", "headless_shell", "chrome"];

/// Default cache directory for an extracted Chromium pack.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("milestone-report-chromium")
}

/// Launches a serverless-optimized Chromium build.
///
/// Executable resolution order: explicit path, previously extracted pack in
/// the cache directory, then download of the pack archive from `pack_url`.
/// The extracted pack is reused by every later launch in the same sandbox.
#[derive(Debug, Clone)]
pub struct ServerlessLauncher {
    executable: Option<PathBuf>,
    pack_url: Option<String>,
    cache_dir: PathBuf,
}

impl Default for ServerlessLauncher {
    fn default() -> Self {
        Self {
            executable: None,
            pack_url: None,
            cache_dir: default_cache_dir(),
        }
    }
}

impl ServerlessLauncher {
    pub fn new(executable: Option<PathBuf>, pack_url: Option<String>) -> Self {
        Self {
            executable,
            pack_url,
            ..Default::default()
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn args() -> Vec<String> {
        SERVERLESS_ARGS.iter().map(|s| s.to_string()).collect()
    }

    pub async fn resolve_executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.executable {
            return if path.is_file() {
                Ok(path.clone())
            } else {
                Err(RenderError::ExecutableNotFound(format!(
                    "{} does not exist",
                    path.display()
                )))
            };
        }

        if let Some(cached) = find_pack_binary(&self.cache_dir) {
            debug!(executable = %cached.display(), "using cached chromium pack");
            return Ok(cached);
        }

        let Some(url) = &self.pack_url else {
            return Err(RenderError::ExecutableNotFound(
                "no chromium executable or pack url configured".into(),
            ));
        };

        self.install_pack(url).await
    }

    async fn install_pack(&self, url: &str) -> Result<PathBuf> {
        info!(url, cache_dir = %self.cache_dir.display(), "downloading chromium pack");
        let pack_error = |message: String| RenderError::PackDownload {
            url: url.to_string(),
            message,
        };

        let response = reqwest::get(url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| pack_error(err.to_string()))?;
        let archive = response
            .bytes()
            .await
            .map_err(|err| pack_error(err.to_string()))?;

        let cache_dir = self.cache_dir.clone();
        let installed = tokio::task::spawn_blocking(move || unpack(&archive, &cache_dir))
            .await
            .map_err(|err| pack_error(err.to_string()))?
            .map_err(pack_error)?;

        info!(executable = %installed.display(), "chromium pack installed");
        Ok(installed)
    }
}

impl BrowserLauncher for ServerlessLauncher {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> Result<ChromiumBrowser> {
        let executable = self.resolve_executable().await?;
        info!(strategy = "serverless", executable = %executable.display(), "launching browser");
        ChromiumBrowser::start(executable, Self::args()).await
    }
}

/// Extract a zip pack next to `cache_dir` and move it into place.
///
/// Extraction happens in a sibling temporary directory that is renamed onto
/// `cache_dir`, so a concurrent launch never sees a half-written pack. When
/// another launch wins the rename, its copy is used; a cache directory left
/// without a browser binary is replaced.
fn unpack(archive: &[u8], cache_dir: &Path) -> std::result::Result<PathBuf, String> {
    let parent = cache_dir
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", cache_dir.display()))?;
    std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;

    let staging = tempfile::Builder::new()
        .prefix(".chromium-pack-")
        .tempdir_in(parent)
        .map_err(|err| err.to_string())?;

    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(|err| err.to_string())?;
    zip.extract(staging.path()).map_err(|err| err.to_string())?;

    if find_pack_binary(staging.path()).is_none() {
        return Err(format!(
            "pack contains none of: {}",
            PACK_BINARY_NAMES.join(", ")
        ));
    }

    let staged = staging.keep();
    if let Err(err) = std::fs::rename(&staged, cache_dir) {
        if find_pack_binary(cache_dir).is_some() {
            // Another launch installed the pack first.
            if let Err(err) = std::fs::remove_dir_all(&staged) {
                warn!(staged = %staged.display(), error = %err, "failed to remove unused pack");
            }
        } else {
            warn!(
                cache_dir = %cache_dir.display(),
                error = %err,
                "replacing stale chromium pack cache"
            );
            replace_stale_cache(&staged, cache_dir)?;
        }
    }

    let binary = find_pack_binary(cache_dir)
        .ok_or_else(|| format!("no browser binary in {}", cache_dir.display()))?;
    mark_executable(&binary).map_err(|err| err.to_string())?;
    Ok(binary)
}

/// Swap a cache directory holding no browser binary for the staged pack.
fn replace_stale_cache(staged: &Path, cache_dir: &Path) -> std::result::Result<(), String> {
    let cleanup = |message: String| {
        let _ = std::fs::remove_dir_all(staged);
        message
    };
    if cache_dir.is_dir() {
        std::fs::remove_dir_all(cache_dir).map_err(|err| {
            cleanup(format!("cannot remove stale {}: {err}", cache_dir.display()))
        })?;
    } else if cache_dir.exists() {
        std::fs::remove_file(cache_dir).map_err(|err| {
            cleanup(format!("cannot remove stale {}: {err}", cache_dir.display()))
        })?;
    }
    std::fs::rename(staged, cache_dir).map_err(|err| {
        cleanup(format!(
            "cannot move pack into {}: {err}",
            cache_dir.display()
        ))
    })
}

/// Locate the browser binary at the top of `dir` or one level below it.
pub fn find_pack_binary(dir: &Path) -> Option<PathBuf> {
    let direct = PACK_BINARY_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    if direct.is_some() {
        return direct;
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    subdirs.iter().find_map(|sub| {
        PACK_BINARY_NAMES
            .iter()
            .map(|name| sub.join(name))
            .find(|path| path.is_file())
    })
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, bytes) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn serverless_flags_include_stability_switches() {
        let args = ServerlessLauncher::args();
        for flag in [
            "--no-sandbox",
            "--disable-setuid-sandbox",
            "--disable-dev-shm-usage",
            "--disable-features=HttpsUpgrades",
        ] {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
    }

    #[tokio::test]
    async fn missing_explicit_executable_is_not_found() {
        let launcher = ServerlessLauncher::new(Some("/nope/chromium".into()), None);
        let err = launcher.resolve_executable().await.unwrap_err();
        assert!(matches!(err, RenderError::ExecutableNotFound(_)));
    }

    #[tokio::test]
    async fn no_executable_and_no_pack_url_is_not_found() {
        let cache = tempfile::tempdir().unwrap();
        let launcher =
            ServerlessLauncher::new(None, None).with_cache_dir(cache.path().join("pack"));
        let err = launcher.resolve_executable().await.unwrap_err();
        assert!(matches!(err, RenderError::ExecutableNotFound(_)));
    }

    #[tokio::test]
    async fn cached_pack_is_reused_without_download() {
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(cache.path().join("chromium"), b"bin").unwrap();

        // The URL is unreachable; resolution must not touch it.
        let launcher = ServerlessLauncher::new(None, Some("http://127.0.0.1:9/pack.zip".into()))
            .with_cache_dir(cache.path());
        let exe = launcher.resolve_executable().await.unwrap();
        assert_eq!(exe, cache.path().join("chromium"));
    }

    #[test]
    fn unpack_installs_nested_binary() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("pack");
        let archive = zip_with(&[("bin/chromium", b"#!/bin/sh\n"), ("bin/README", b"x")]);

        let binary = unpack(&archive, &cache).unwrap();
        assert_eq!(binary, cache.join("bin").join("chromium"));
        assert_eq!(std::fs::read(&binary).unwrap(), b"#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn unpack_rejects_pack_without_browser() {
        let root = tempfile::tempdir().unwrap();
        let archive = zip_with(&[("README", b"nothing here")]);
        let err = unpack(&archive, &root.path().join("pack")).unwrap_err();
        assert!(err.contains("pack contains none of"));
        assert!(!root.path().join("pack").exists());
    }

    #[test]
    fn unpack_replaces_stale_cache_without_browser() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("pack");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("leftover.txt"), b"old layout").unwrap();

        let archive = zip_with(&[("chromium", b"#!/bin/sh\n")]);
        let binary = unpack(&archive, &cache).unwrap();

        assert_eq!(binary, cache.join("chromium"));
        assert!(!cache.join("leftover.txt").exists());
    }

    #[test]
    fn unpack_keeps_pack_installed_by_another_launch() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("pack");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("headless_shell"), b"installed").unwrap();

        let archive = zip_with(&[("chromium", b"#!/bin/sh\n")]);
        let binary = unpack(&archive, &cache).unwrap();

        assert_eq!(binary, cache.join("headless_shell"));
        assert_eq!(std::fs::read(&binary).unwrap(), b"installed");
        let leftovers: Vec<_> = std::fs::read_dir(root.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != "pack")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn unpack_rejects_non_zip_bytes() {
        let root = tempfile::tempdir().unwrap();
        assert!(unpack(b"not a zip", &root.path().join("pack")).is_err());
    }
}
