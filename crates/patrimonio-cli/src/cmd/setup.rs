//! `pt setup` — validate and persist the remote connection.

use clap::Args;
use patrimonio_core::config;
use patrimonio_core::error::ErrorCode;
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use crate::output::{OutputMode, fail_code, render};

const SERVICE_ROLE_WARNING: &str = "this key looks like a service-role key; use the public anon key \
     so row-level security applies";

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Project URL, e.g. https://xyz.supabase.co
    #[arg(long)]
    pub url: String,

    /// Public anon key of the project.
    #[arg(long)]
    pub key: String,
}

#[derive(Debug, Serialize)]
struct SetupReport {
    config_file: String,
    url: String,
    warnings: Vec<String>,
}

pub fn run_setup(args: &SetupArgs, output: OutputMode) -> anyhow::Result<()> {
    let to_cli = |err: config::ConfigError| fail_code(output, err.code(), err.to_string());

    let url = config::validate_url(&args.url).map_err(to_cli)?;
    let key = args.key.trim();
    if key.is_empty() {
        return Err(fail_code(output, ErrorCode::InvalidInput, "anon key must not be empty"));
    }

    let mut warnings = Vec::new();
    if config::looks_like_service_role_key(key) {
        warn!("{SERVICE_ROLE_WARNING}");
        warnings.push(SERVICE_ROLE_WARNING.to_string());
    }

    let dir = config::config_dir().map_err(to_cli)?;
    let mut file = config::load_file(&dir).map_err(to_cli)?;
    file.remote.url = Some(url.clone());
    file.remote.anon_key = Some(key.to_string());
    let path = config::write_file(&dir, &file).map_err(to_cli)?;
    info!(path = %path.display(), "remote configured");

    let report = SetupReport {
        config_file: path.display().to_string(),
        url,
        warnings,
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ remote configured: {}", r.url)?;
        writeln!(w, "  saved to {}", r.config_file)?;
        for warning in &r.warnings {
            writeln!(w, "warning: {warning}")?;
        }
        Ok(())
    })
}
