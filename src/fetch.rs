use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// GET a URL, or read a path relative to `asset_dir`
pub fn fetch_text(source: &str, asset_dir: &Path) -> Result<String> {
    if is_remote(source) {
        get(source)
    } else {
        let path = asset_dir.join(source);
        tracing::debug!(path = %path.display(), "reading local document");
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Plain GET; any non-2xx status is an error
pub fn get(url: &str) -> Result<String> {
    tracing::debug!(url, "GET");
    let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
    let response = agent.get(url).call().map_err(|e| {
        let reason = match e {
            ureq::Error::Status(code, _) => format!("HTTP {}", code),
            ureq::Error::Transport(t) => t.to_string(),
        };
        Error::Http {
            url: url.to_string(),
            reason,
        }
    })?;
    Ok(response.into_string()?)
}
