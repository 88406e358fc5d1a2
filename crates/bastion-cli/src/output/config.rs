// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use console::style;

use crate::cli::OutputContext;
use crate::commands::types::ConfigResult;

use super::Renderable;

impl Renderable for ConfigResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let c = &self.config;
        let or_unset = |v: Option<String>| v.unwrap_or_else(|| "(unset)".to_string());

        writeln!(w, "{}", style(format!("# {}", self.source.display())).dim())?;

        writeln!(w, "{}", style("[connector]").bold())?;
        writeln!(w, "allowed_hosts      = {:?}", c.connector.allowed_hosts)?;
        writeln!(w, "allowed_schemes    = {:?}", c.connector.allowed_schemes)?;
        writeln!(w, "connect_timeout_ms = {}", c.connector.connect_timeout_ms)?;
        writeln!(w)?;

        writeln!(w, "{}", style("[store]").bold())?;
        writeln!(
            w,
            "root = {}",
            or_unset(c.store.root.as_ref().map(|p| p.display().to_string()))
        )?;
        writeln!(w)?;

        writeln!(w, "{}", style("[api]").bold())?;
        writeln!(w, "base_url               = {}", or_unset(c.api.base_url.clone()))?;
        writeln!(w, "timeout_seconds        = {}", c.api.timeout_seconds)?;
        writeln!(w, "enrichment_field       = {}", c.api.enrichment_field)?;
        writeln!(w, "details_field          = {}", c.api.details_field)?;
        writeln!(w, "require_https          = {}", c.api.require_https)?;
        writeln!(w, "same_origin_enrichment = {}", c.api.same_origin_enrichment)?;
        writeln!(w, "max_concurrency        = {}", c.api.max_concurrency)?;
        writeln!(w, "user_agent             = {}", c.api.user_agent)?;
        Ok(())
    }
}
