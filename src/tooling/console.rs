//! Line-oriented console frontends for the Directory and Editor.

use crate::dispatch::DisplayRefresh;
use crate::editor::EditorView;
use crate::ids::Confirm;
use crate::input::InputLines;
use crate::types::Record;
use crate::views::RecordView;
use async_trait::async_trait;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Render a listing as a table with a heading and match count.
pub fn format_record_view(view: &RecordView) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format_section_heading("Staff")));
    if view.filter.is_empty() {
        out.push_str(&format!("  {} records\n", view.total));
    } else {
        out.push_str(&format!(
            "  Filter '{}': {} of {} records\n",
            view.filter,
            view.records.len(),
            view.total
        ));
    }
    if view.records.is_empty() {
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name"]);
    for record in &view.records {
        table.add_row(vec![record.id.to_string(), record.name.clone()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Render the Editor's displayed record.
pub fn format_selection(selection: Option<&Record>) -> String {
    match selection {
        Some(record) => format!(
            "{} {}  {} {}",
            "ID:".bold(),
            record.id,
            "Name:".bold(),
            record.name
        ),
        None => format!("{}", "No record selected".dimmed()),
    }
}

fn print_notice(message: &str) {
    println!("{} {}", "!".yellow().bold(), message);
}

/// Directory and Editor display on stdout
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl DisplayRefresh for ConsoleDisplay {
    fn refresh(&mut self, view: &RecordView) {
        print!("{}", format_record_view(view));
        let _ = std::io::stdout().flush();
    }

    fn notice(&mut self, message: &str) {
        print_notice(message);
    }
}

impl EditorView for ConsoleDisplay {
    fn show_selection(&mut self, selection: Option<&Record>) {
        println!("{}", format_selection(selection));
    }

    fn notice(&mut self, message: &str) {
        print_notice(message);
    }
}

/// Confirmation read from the shared console input
///
/// A pending prompt is answered "no" once `shutdown` fires.
pub struct LineConfirm {
    input: InputLines,
    shutdown: CancellationToken,
}

impl LineConfirm {
    pub fn new(input: InputLines, shutdown: CancellationToken) -> Self {
        Self { input, shutdown }
    }
}

/// `y` or `yes`, any case.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirm for LineConfirm {
    async fn confirm(&self, message: &str) -> bool {
        print!("{} {} [y/N] ", "?".cyan().bold(), message);
        let _ = std::io::stdout().flush();
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                println!();
                false
            }
            answer = self.input.next_line() => match answer {
                Some(answer) => is_affirmative(&answer),
                None => false,
            },
        }
    }
}
