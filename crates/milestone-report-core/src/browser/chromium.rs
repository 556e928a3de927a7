use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::browser::{Browser, PdfOptions, with_print_css};
use crate::error::{RenderError, Result};

const PAGE_FILE: &str = "report.html";
const PDF_FILE: &str = "report.pdf";
const LOG_FILE: &str = "chromium.log";
const PROFILE_DIR: &str = "profile";

/// A headless Chromium session.
///
/// The session owns a private work directory holding the browser profile,
/// the page being printed and the browser log. Each print runs the browser
/// with `--print-to-pdf`; the child is spawned with `kill_on_drop` so it
/// cannot outlive the session even if the render future is dropped.
#[derive(Debug)]
pub struct ChromiumBrowser {
    executable: PathBuf,
    args: Vec<String>,
    workdir: Option<TempDir>,
    child: Option<Child>,
}

impl ChromiumBrowser {
    /// Prepare a session for `executable` with the given launch flags.
    pub async fn start(executable: PathBuf, args: Vec<String>) -> Result<Self> {
        let metadata = tokio::fs::metadata(&executable).await.map_err(|err| {
            RenderError::Launch(format!("{}: {err}", executable.display()))
        })?;
        if !metadata.is_file() {
            return Err(RenderError::Launch(format!(
                "{} is not a file",
                executable.display()
            )));
        }

        let workdir = tempfile::Builder::new()
            .prefix("milestone-report-")
            .tempdir()
            .map_err(|err| RenderError::Launch(format!("cannot create work directory: {err}")))?;
        std::fs::create_dir_all(workdir.path().join(PROFILE_DIR))?;

        info!(
            executable = %executable.display(),
            workdir = %workdir.path().display(),
            "browser session started"
        );

        Ok(Self {
            executable,
            args,
            workdir: Some(workdir),
            child: None,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn is_closed(&self) -> bool {
        self.workdir.is_none()
    }

    /// Full argument list for one print of `page` into `output`.
    pub fn print_args(
        &self,
        workdir: &Path,
        page: &Path,
        output: &Path,
        options: &PdfOptions,
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(format!(
            "--user-data-dir={}",
            workdir.join(PROFILE_DIR).display()
        ));
        args.push("--no-first-run".to_string());
        args.push("--no-pdf-header-footer".to_string());
        args.push("--print-to-pdf-no-header".to_string());
        args.push("--run-all-compositor-stages-before-draw".to_string());
        args.push(format!(
            "--virtual-time-budget={}",
            options.network_idle_budget.as_millis()
        ));
        args.push(format!("--print-to-pdf={}", output.display()));
        args.push(file_url(page));
        args
    }
}

impl Browser for ChromiumBrowser {
    async fn print_to_pdf(&mut self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let workdir = match &self.workdir {
            Some(dir) => dir.path().to_path_buf(),
            None => return Err(RenderError::Render("browser session is closed".into())),
        };
        let page = workdir.join(PAGE_FILE);
        let output = workdir.join(PDF_FILE);
        let log_path = workdir.join(LOG_FILE);

        tokio::fs::write(&page, with_print_css(html, options)).await?;
        if tokio::fs::try_exists(&output).await? {
            tokio::fs::remove_file(&output).await?;
        }

        let args = self.print_args(&workdir, &page, &output, options);
        debug!(executable = %self.executable.display(), ?args, "spawning chromium");

        let log = std::fs::File::create(&log_path)?;
        let child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                RenderError::Launch(format!("{}: {err}", self.executable.display()))
            })?;

        let status = self
            .child
            .insert(child)
            .wait()
            .await
            .map_err(|err| RenderError::Render(format!("waiting for chromium: {err}")))?;
        self.child = None;

        if !status.success() {
            let log = tokio::fs::read_to_string(&log_path).await.unwrap_or_default();
            return Err(RenderError::Render(format!(
                "chromium exited with {status}: {}",
                log_tail(&log, 20)
            )));
        }

        let pdf = tokio::fs::read(&output)
            .await
            .map_err(|err| RenderError::Extraction(format!("no pdf written: {err}")))?;
        info!(size = pdf.len(), "chromium printed page");
        Ok(pdf)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill chromium process");
            }
        }
        if let Some(dir) = self.workdir.take() {
            let path = dir.path().display().to_string();
            dir.close()?;
            debug!(workdir = %path, "browser session closed");
        }
        Ok(())
    }
}

fn file_url(path: &Path) -> String {
    let raw = path.display().to_string().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{raw}")
    } else {
        format!("file:///{raw}")
    }
}

/// Last `lines` lines of a browser log, for error messages.
fn log_tail(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
