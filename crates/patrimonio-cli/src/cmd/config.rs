//! `pt config show` — effective configuration with secrets masked.

use clap::Subcommand;
use patrimonio_core::config::ConfigReport;
use std::io::Write;

use crate::context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    #[command(
        about = "Show the effective configuration",
        after_help = "EXAMPLES:\n    # Show settings, secrets masked\n    pt config show\n\n    # Emit machine-readable output\n    pt config show --json"
    )]
    Show,
}

fn or_unset(value: Option<&String>) -> &str {
    value.map_or("(unset)", String::as_str)
}

pub fn run_config(command: &ConfigCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            let report = context::load_config(output)?.report();
            render_mode(
                output,
                &report,
                |r: &ConfigReport, w| {
                    writeln!(w, "config_dir\t{}", r.config_dir)?;
                    writeln!(w, "url\t{}", or_unset(r.url.as_ref()))?;
                    writeln!(w, "anon_key\t{}", or_unset(r.anon_key.as_ref()))?;
                    writeln!(w, "ai_api_key\t{}", or_unset(r.ai_api_key.as_ref()))?;
                    writeln!(w, "ai_model\t{}", r.ai_model)?;
                    writeln!(w, "admin_code\t{}", or_unset(r.admin_code.as_ref()))?;
                    writeln!(w, "output\t{}", or_unset(r.output.as_ref()))
                },
                |r: &ConfigReport, w| {
                    pretty_section(w, "Configuration")?;
                    pretty_kv(w, "Directory", &r.config_dir)?;
                    pretty_kv(w, "URL", or_unset(r.url.as_ref()))?;
                    pretty_kv(w, "Anon key", or_unset(r.anon_key.as_ref()))?;
                    pretty_kv(w, "AI key", or_unset(r.ai_api_key.as_ref()))?;
                    pretty_kv(w, "AI model", &r.ai_model)?;
                    if let Some(url) = &r.ai_base_url {
                        pretty_kv(w, "AI endpoint", url)?;
                    }
                    pretty_kv(w, "Admin code", or_unset(r.admin_code.as_ref()))?;
                    pretty_kv(w, "Output", or_unset(r.output.as_ref()))
                },
            )
        }
    }
}
