// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use console::style;

use crate::cli::OutputContext;
use crate::commands::types::{FileListResult, FileReadResult, FileRemoveResult, FileWriteResult};

use super::Renderable;

impl Renderable for FileReadResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        w.write_all(&self.bytes)?;
        // Keep the prompt on its own line when printing to a terminal.
        if ctx.is_tty && !self.bytes.is_empty() && !self.bytes.ends_with(b"\n") {
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Renderable for FileWriteResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let verb = if self.replaced { "Replaced" } else { "Created" };
        writeln!(
            w,
            "{} {} {} ({} bytes)",
            style("✓").green(),
            verb,
            style(&self.path).cyan(),
            self.bytes_written
        )
    }
}

impl Renderable for FileListResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        if self.entries.is_empty() {
            return writeln!(w, "{}", style("No files").dim());
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.name.chars().count())
            .max()
            .unwrap_or(0);

        for entry in &self.entries {
            let modified = entry.modified.map_or_else(
                || "-".to_string(),
                |m| {
                    if ctx.verbose {
                        m.to_rfc3339()
                    } else {
                        m.format("%Y-%m-%d %H:%M").to_string()
                    }
                },
            );
            writeln!(
                w,
                "  {}  {:>10}  {}",
                style(format!("{:<width$}", entry.name)).cyan(),
                entry.size,
                style(modified).dim()
            )?;
        }
        Ok(())
    }
}

impl Renderable for FileRemoveResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "{} Removed {}", style("✓").green(), style(&self.path).cyan())
    }
}
