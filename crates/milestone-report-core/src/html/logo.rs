use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

/// Logo locations probed in order, relative to the asset root.
pub const LOGO_CANDIDATES: [&str; 3] = [
    "assets/logo.png",
    "assets/deep-funding-logo.png",
    "public/logo.png",
];

const FALLBACK_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="120" viewBox="0 0 120 120"><defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1"><stop offset="0%" stop-color="#6366f1"/><stop offset="100%" stop-color="#06b6d4"/></linearGradient></defs><rect width="120" height="120" rx="24" fill="url(#g)"/><text x="60" y="74" font-family="Helvetica, Arial, sans-serif" font-size="44" font-weight="700" fill="#ffffff" text-anchor="middle">DF</text></svg>"##;

/// Resolve the report logo as a data URI.
///
/// The first readable candidate under `root` is embedded as PNG. When none
/// can be read, a generated SVG mark is embedded instead; this never fails.
pub fn logo_data_url(root: &Path) -> String {
    for candidate in LOGO_CANDIDATES {
        let path = root.join(candidate);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), size = bytes.len(), "embedding logo");
                return format!("data:image/png;base64,{}", STANDARD.encode(bytes));
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "logo candidate unavailable");
            }
        }
    }

    fallback_logo_data_url()
}

pub fn fallback_logo_data_url() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(FALLBACK_SVG.as_bytes())
    )
}
