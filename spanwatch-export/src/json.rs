//! JSON rendering of the full summary.

use spanwatch_types::Summary;

use crate::error::Result;

/// Pretty-printed JSON of the whole summary.
pub fn render_summary(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
