use anyhow::Result;

use crate::provision::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Toml,
    Json,
}

/// Render the resource state for stdout, newline terminated.
pub fn render_state(state: &ResourceState, format: OutputFormat) -> Result<String> {
    let mut out = match format {
        OutputFormat::Toml => toml::to_string_pretty(state)?,
        OutputFormat::Json => serde_json::to_string_pretty(state)?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
