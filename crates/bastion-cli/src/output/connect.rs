// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use console::style;

use crate::cli::OutputContext;
use crate::commands::types::ConnectResult;

use super::Renderable;

impl Renderable for ConnectResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        writeln!(
            w,
            "{} Connected to {} via {}",
            style("✓").green(),
            style(&self.host).cyan(),
            style(&self.descriptor).dim()
        )?;
        if ctx.verbose {
            writeln!(w, "  handle:    {}", self.id)?;
            writeln!(w, "  opened at: {}", self.opened_at.to_rfc3339())?;
        }
        writeln!(w, "  status:    {}", self.status)?;
        Ok(())
    }
}
