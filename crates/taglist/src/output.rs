//! Terminal output utilities

use anyhow::{Context, Result};
use console::style;
use taglist_core::OutputFormat;

/// Print a status line on stderr, leaving stdout to the results
pub fn status(msg: &str) {
    eprintln!("{}", style(msg).dim().for_stderr());
}

/// Render a tag listing in the requested format
pub fn render_tags(tags: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(tags).context("Error marshalling tags"),
        OutputFormat::Text => Ok(format!("tags: {}", tags.join(", "))),
    }
}
