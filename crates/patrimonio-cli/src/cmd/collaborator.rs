//! `pt collaborator` — list, inspect, add and remove collaborators.

use clap::{Args, Subcommand};
use patrimonio_core::error::ErrorCode;
use patrimonio_core::model::{Asset, Collaborator};
use patrimonio_core::projection::{collaborator_assets, search_collaborators};
use serde::Serialize;
use std::io::Write;

use crate::cmd::confirmed;
use crate::context::{self, DataContext};
use crate::output::{OutputMode, fail_code, pretty_kv, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum CollaboratorCommand {
    #[command(
        about = "List collaborators",
        after_help = "EXAMPLES:\n    # List everyone\n    pt collaborator list\n\n    # Filter by name, username or asset tag\n    pt collaborator list --search PAT-001"
    )]
    List(ListArgs),

    #[command(
        about = "Show a collaborator and their assets",
        after_help = "EXAMPLES:\n    # Expand one collaborator\n    pt collaborator show 7\n\n    # Emit machine-readable output\n    pt collaborator show 7 --json"
    )]
    Show(ShowArgs),

    #[command(
        about = "Register a collaborator",
        after_help = "EXAMPLES:\n    # Add a collaborator\n    pt collaborator add --full-name \"Ana Silva\" --username asilva"
    )]
    Add(AddArgs),

    #[command(
        about = "Remove a collaborator and their assets",
        long_about = "Remove a collaborator. Assets held by the collaborator are removed with them.",
        after_help = "EXAMPLES:\n    # Remove without prompting\n    pt collaborator delete 7 --yes"
    )]
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive filter on name, username or owned asset tag.
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Collaborator id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Full name.
    #[arg(long = "full-name")]
    pub full_name: String,

    /// Username.
    #[arg(long)]
    pub username: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collaborator id.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct CollaboratorRow<'a> {
    id: &'a str,
    full_name: &'a str,
    username: &'a str,
    asset_count: usize,
}

impl<'a> From<&'a Collaborator> for CollaboratorRow<'a> {
    fn from(c: &'a Collaborator) -> Self {
        Self {
            id: &c.id,
            full_name: &c.full_name,
            username: &c.username,
            asset_count: c.asset_count(),
        }
    }
}

pub fn run_collaborator(command: &CollaboratorCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        CollaboratorCommand::List(args) => run_list(args, output),
        CollaboratorCommand::Show(args) => run_show(args, output),
        CollaboratorCommand::Add(args) => run_add(args, output),
        CollaboratorCommand::Delete(args) => run_delete(args, output),
    }
}

fn run_list(args: &ListArgs, output: OutputMode) -> anyhow::Result<()> {
    let ctx = DataContext::open(output)?;
    let term = args.search.as_deref().unwrap_or_default();
    let rows: Vec<CollaboratorRow<'_>> = search_collaborators(&ctx.state().collaborators, term)
        .into_iter()
        .map(CollaboratorRow::from)
        .collect();

    render_mode(
        output,
        &rows,
        |rows, w| {
            for r in rows {
                writeln!(w, "{}\t{}\t{}\t{}", r.id, r.full_name, r.username, r.asset_count)?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No collaborators found");
            }
            writeln!(w, "{:<8} {:<28} {:<16} {:>6}", "ID", "NAME", "USERNAME", "ASSETS")?;
            for r in rows {
                writeln!(
                    w,
                    "{:<8} {:<28} {:<16} {:>6}",
                    r.id, r.full_name, r.username, r.asset_count
                )?;
            }
            Ok(())
        },
    )
}

fn write_asset_line(w: &mut dyn Write, asset: &Asset) -> std::io::Result<()> {
    writeln!(
        w,
        "  {:<10} {:<24} {:<14} {}",
        asset.asset_tag, asset.name, asset.category, asset.status
    )
}

fn run_show(args: &ShowArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    ctx.session
        .expand(&args.id)
        .map_err(|err| context::session_failure(output, &err))?;

    let expanded = ctx
        .session
        .view()
        .expanded
        .as_deref()
        .and_then(|id| ctx.state().collaborator(id));
    let Some(collaborator) = expanded else {
        return Err(fail_code(
            output,
            ErrorCode::CollaboratorNotFound,
            format!("collaborator not found: {}", args.id),
        ));
    };

    render_mode(
        output,
        collaborator,
        |c, w| {
            writeln!(w, "{}\t{}\t{}", c.id, c.full_name, c.username)?;
            for a in collaborator_assets(c) {
                writeln!(w, "{}\t{}\t{}\t{}\t{}", a.id, a.asset_tag, a.name, a.category, a.status)?;
            }
            Ok(())
        },
        |c, w| {
            pretty_section(w, &c.full_name)?;
            pretty_kv(w, "ID", &c.id)?;
            pretty_kv(w, "Username", &c.username)?;
            pretty_kv(w, "Assets", c.asset_count().to_string())?;
            let assets = collaborator_assets(c);
            if assets.is_empty() {
                writeln!(w, "  (no assets)")?;
            }
            for asset in assets {
                write_asset_line(w, asset)?;
            }
            Ok(())
        },
    )
}

#[derive(Debug, Serialize)]
struct AddReport {
    id: String,
    full_name: String,
    username: String,
}

fn run_add(args: &AddArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    let form = ctx.session.collaborator_form_mut();
    form.open = true;
    form.full_name.clone_from(&args.full_name);
    form.username.clone_from(&args.username);

    let id = ctx
        .session
        .submit_collaborator_form()
        .map_err(|err| context::mutation_failure(output, &err))?;

    let report = AddReport {
        id,
        full_name: args.full_name.trim().to_string(),
        username: args.username.trim().to_string(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ added collaborator {} ({}) as {}", r.full_name, r.username, r.id)
    })
}

#[derive(Debug, Serialize)]
struct DeleteReport {
    id: String,
    full_name: String,
    assets_removed: usize,
}

fn run_delete(args: &DeleteArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    let Some(target) = ctx.state().collaborator(&args.id) else {
        return Err(fail_code(
            output,
            ErrorCode::CollaboratorNotFound,
            format!("collaborator not found: {}", args.id),
        ));
    };
    let report = DeleteReport {
        id: target.id.clone(),
        full_name: target.full_name.clone(),
        assets_removed: target.asset_count(),
    };

    let prompt = format!(
        "Delete {} and their {} asset(s)?",
        report.full_name, report.assets_removed
    );
    if !confirmed(args.yes, &prompt)? {
        return Err(fail_code(
            output,
            ErrorCode::InvalidInput,
            "deletion not confirmed; pass --yes to delete without a prompt",
        ));
    }

    ctx.session
        .delete_collaborator(&args.id)
        .map_err(|err| context::mutation_failure(output, &err))?;

    render(output, &report, |r, w| {
        writeln!(
            w,
            "✓ deleted {} ({} asset(s) removed)",
            r.full_name, r.assets_removed
        )
    })
}
