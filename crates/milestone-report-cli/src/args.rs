use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "milestone-report",
    version,
    about = "Render Deep Funding milestone review reports to HTML and PDF"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a report record to PDF
    Render {
        /// Path to the report record (JSON)
        input: PathBuf,

        /// Where to write the PDF; defaults to the input path with a .pdf extension
        #[arg(long)]
        out: Option<PathBuf>,

        /// Summary format printed after rendering
        #[arg(long, default_value = "json")]
        summary: SummaryFormat,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Build the report HTML without launching a browser
    Preview {
        /// Path to the report record (JSON)
        input: PathBuf,

        /// Write HTML to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// HTML template providing the report stylesheet
    #[arg(long, env = "MILESTONE_REPORT_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Directory the logo is looked up in
    #[arg(long, env = "MILESTONE_REPORT_ASSET_ROOT")]
    pub asset_root: Option<PathBuf>,

    /// Use the serverless Chromium strategy
    #[arg(long)]
    pub serverless: bool,

    /// Explicit browser executable
    #[arg(long, env = "CHROMIUM_EXECUTABLE_PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Zip archive with a Chromium build, fetched in serverless mode
    #[arg(long, env = "CHROMIUM_PACK_URL")]
    pub chromium_pack_url: Option<String>,

    /// Abort the render after this many seconds (overrides MILESTONE_REPORT_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Insert submitted text into the HTML without escaping
    #[arg(long)]
    pub verbatim_html: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum SummaryFormat {
    Json,
    Text,
}
