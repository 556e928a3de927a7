use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use milestone_report_core::html::build_report_html;
use milestone_report_core::html::template::Interpolation;
use milestone_report_core::report::summary;
use milestone_report_core::{MilestoneReportData, RenderConfig, render_report};

mod args;

use args::{Command, CommonArgs, SummaryFormat};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = args::Args::parse();

    match args.command {
        Command::Render {
            input,
            out,
            summary: format,
            common,
        } => {
            let data = read_report(&input)?;
            let config = build_config(&common);
            let rendered = render_report(&data, &config)
                .await
                .with_context(|| format!("failed to render {}", input.display()))?;

            let out = out.unwrap_or_else(|| input.with_extension("pdf"));
            std::fs::write(&out, &rendered.pdf)
                .with_context(|| format!("failed to write {}", out.display()))?;

            let output = match format {
                SummaryFormat::Json => {
                    let mut value = serde_json::to_value(&rendered.summary)?;
                    value["output"] = serde_json::Value::String(out.display().to_string());
                    serde_json::to_string_pretty(&value)? + "\n"
                }
                SummaryFormat::Text => {
                    format!(
                        "Output: {}\n{}",
                        out.display(),
                        summary::render_text(&rendered.summary)
                    )
                }
            };
            print!("{output}");
        }
        Command::Preview { input, out, common } => {
            let data = read_report(&input)?;
            let config = build_config(&common);
            let html = build_report_html(
                &data,
                &config.template_path,
                &config.asset_root,
                config.interpolation,
            )
            .with_context(|| format!("failed to build html for {}", input.display()))?;

            match out {
                Some(path) => std::fs::write(&path, &html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{html}"),
            }
        }
    }

    Ok(())
}

fn read_report(path: &Path) -> Result<MilestoneReportData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report record {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid report record {}", path.display()))
}

/// Environment configuration with command-line overrides applied.
fn build_config(common: &CommonArgs) -> RenderConfig {
    let mut config = RenderConfig::from_env();

    if let Some(template) = &common.template {
        config.template_path = template.clone();
    }
    if let Some(root) = &common.asset_root {
        config.asset_root = root.clone();
    }
    if common.serverless {
        config.serverless = true;
    }
    if let Some(path) = &common.chromium_path {
        config.chromium_path = Some(path.clone());
    }
    if let Some(url) = &common.chromium_pack_url {
        config.chromium_pack_url = Some(url.clone());
    }
    if let Some(secs) = common.timeout_secs {
        config.timeout = std::time::Duration::from_secs(secs);
    }
    if common.verbatim_html {
        config.interpolation = Interpolation::Verbatim;
    }

    config
}
