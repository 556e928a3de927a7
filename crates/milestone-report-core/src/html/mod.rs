pub mod date;
pub mod logo;
pub mod template;

use std::path::Path;

use crate::error::Result;
use crate::report::model::MilestoneReportData;
use template::{Interpolation, TemplateSource};

/// Load the template, resolve the logo and build the report document.
pub fn build_report_html(
    data: &MilestoneReportData,
    template_path: &Path,
    asset_root: &Path,
    mode: Interpolation,
) -> Result<String> {
    let template = TemplateSource::from_path(template_path)?;
    let logo = logo::logo_data_url(asset_root);
    Ok(template::build_html(&data.normalize(), &template, &logo, mode))
}
