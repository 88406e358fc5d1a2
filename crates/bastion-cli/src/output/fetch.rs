// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use console::style;
use serde_json::Value;

use crate::cli::OutputContext;
use crate::commands::types::{BatchResult, FetchOutput};

use super::Renderable;

fn pretty(value: &Value) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

impl Renderable for FetchOutput {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        if ctx.verbose {
            let note = if self.enriched {
                "with details"
            } else {
                "without details"
            };
            writeln!(w, "{}", style(format!("user {} ({note})", self.id)).dim())?;
        }
        writeln!(w, "{}", pretty(&self.user)?)
    }
}

impl Renderable for BatchResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        for item in &self.results {
            match (&item.user, &item.error) {
                (Some(user), _) => {
                    writeln!(w, "{} {}", style("✓").green(), style(&item.id).cyan())?;
                    for line in pretty(user)?.lines() {
                        writeln!(w, "    {line}")?;
                    }
                }
                (None, Some(error)) => {
                    writeln!(
                        w,
                        "{} {} {}",
                        style("✗").red(),
                        style(&item.id).cyan(),
                        style(error).dim()
                    )?;
                }
                (None, None) => {}
            }
        }
        Ok(())
    }
}
