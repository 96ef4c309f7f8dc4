//! Rendering for `--output`: rounded tables, pretty or compact JSON, or
//! bare ids for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use huelink_core::BridgeStatus;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout and honours `NO_COLOR`.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

pub fn paint_status(status: &BridgeStatus, color: bool) -> String {
    let text = status.to_string();
    if !color {
        return text;
    }
    match status {
        BridgeStatus::Online => text.green().to_string(),
        BridgeStatus::Initializing => text.yellow().to_string(),
        BridgeStatus::Offline { .. } => text.red().to_string(),
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// Render `items` as the chosen format. Tables go through `row`, plain
/// output prints one `id` per line, JSON serializes the items as-is.
pub fn render_list<T, R>(
    format: &OutputFormat,
    items: &[T],
    row: impl Fn(&T) -> R,
    id: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    let rendered = match format {
        OutputFormat::Table if items.is_empty() => String::new(),
        OutputFormat::Table => Table::new(items.iter().map(row)).with(Style::rounded()).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(items)?,
        OutputFormat::JsonCompact => serde_json::to_string(items)?,
        OutputFormat::Plain => {
            let ids: Vec<String> = items.iter().map(id).collect();
            ids.join("\n")
        }
    };
    Ok(rendered)
}

/// Write to stdout unless `--quiet` or there is nothing to say.
pub fn print_output(text: &str, quiet: bool) {
    if quiet || text.is_empty() {
        return;
    }
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{text}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use huelink_core::{StatusDetail, StatusReason};

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: String,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: "1".into() }, Item { id: "7".into() }]
    }

    fn render(format: &OutputFormat, data: &[Item]) -> String {
        render_list(format, data, |i| Row { id: i.id.clone() }, |i| i.id.clone()).unwrap()
    }

    #[test]
    fn plain_prints_one_id_per_line() {
        assert_eq!(render(&OutputFormat::Plain, &items()), "1\n7");
    }

    #[test]
    fn compact_json_keeps_fields() {
        assert_eq!(
            render(&OutputFormat::JsonCompact, &items()),
            r#"[{"id":"1"},{"id":"7"}]"#
        );
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(render(&OutputFormat::Table, &[]), "");
        assert!(render(&OutputFormat::Table, &items()).contains("ID"));
    }

    #[test]
    fn uncolored_status_is_plain_text() {
        let status = BridgeStatus::offline(StatusDetail::None, StatusReason::ConnectionLost);
        assert_eq!(paint_status(&status, false), "offline: connection to the bridge lost");
    }
}
