//! `pt export` — write the (optionally filtered) global list to CSV.

use clap::Args;
use patrimonio_core::export::{DEFAULT_EXPORT_FILE, export_to_path};
use patrimonio_core::projection::global_assets;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::context::DataContext;
use crate::output::{OutputMode, fail_code, render};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination file; replaced if it exists.
    #[arg(long, short, default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,

    /// Export only assets matching this search term.
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    path: String,
    rows: usize,
}

pub fn run_export(args: &ExportArgs, output: OutputMode) -> anyhow::Result<()> {
    let ctx = DataContext::open(output)?;
    let term = args.search.as_deref().unwrap_or_default();
    let listings = global_assets(ctx.state(), term);

    let rows = export_to_path(&listings, &args.output)
        .map_err(|err| fail_code(output, err.code(), err.to_string()))?;

    let report = ExportReport {
        path: args.output.display().to_string(),
        rows,
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ exported {} asset(s) to {}", r.rows, r.path)
    })
}
