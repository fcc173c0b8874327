//! `pt asset` — the global asset list and asset mutations.

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Subcommand};
use patrimonio_core::error::ErrorCode;
use patrimonio_core::model::{AssetFields, AssetStatus};
use patrimonio_core::projection::{AssetListing, global_assets};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::cmd::confirmed;
use crate::context::{self, DataContext};
use crate::output::{OutputMode, fail_code, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum AssetCommand {
    #[command(
        about = "List all assets",
        long_about = "List every asset: owned assets first, then the unassigned pool.",
        after_help = "EXAMPLES:\n    # Everything\n    pt asset list\n\n    # Search name, tag, category or owner\n    pt asset list --search monitor"
    )]
    List(ListArgs),

    #[command(
        about = "Register an asset",
        after_help = "EXAMPLES:\n    # Unassigned asset\n    pt asset add --name Laptop --tag PAT-001 --category Notebook\n\n    # Assign on creation and let the AI fill category/description\n    pt asset add --name \"Dell U2720Q\" --tag PAT-002 --owner 7 --suggest"
    )]
    Add(AddArgs),

    #[command(
        about = "Edit an asset",
        long_about = "Change fields of an asset. Fields not given keep their current value; the owner never changes.",
        after_help = "EXAMPLES:\n    # Deactivate an asset\n    pt asset edit 12 --status deactivated"
    )]
    Edit(EditArgs),

    #[command(
        about = "Remove an asset",
        after_help = "EXAMPLES:\n    # Remove without prompting\n    pt asset delete 12 --yes"
    )]
    Delete(DeleteArgs),

    #[command(
        about = "Move an asset to another collaborator or the unassigned pool",
        after_help = "EXAMPLES:\n    # Hand an asset over\n    pt asset transfer 12 --to 7\n\n    # Return it to the pool\n    pt asset transfer 12 --unassign"
    )]
    Transfer(TransferArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive filter on name, tag, category or owner.
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Asset name.
    #[arg(long)]
    pub name: String,

    /// Patrimony tag.
    #[arg(long)]
    pub tag: String,

    /// Category; may be filled by --suggest.
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Acquisition date (YYYY-MM-DD).
    #[arg(long)]
    pub acquired: Option<NaiveDate>,

    /// Status: active or deactivated.
    #[arg(long, default_value = "active")]
    pub status: AssetStatus,

    /// Collaborator id that receives the asset; unassigned when omitted.
    #[arg(long)]
    pub owner: Option<String>,

    /// Ask the AI assistant for category and description when not given.
    #[arg(long)]
    pub suggest: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Asset id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Acquisition date (YYYY-MM-DD).
    #[arg(long, conflicts_with = "clear_acquired")]
    pub acquired: Option<NaiveDate>,

    /// Remove the acquisition date.
    #[arg(long = "clear-acquired")]
    pub clear_acquired: bool,

    #[arg(long)]
    pub status: Option<AssetStatus>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Asset id.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["to", "unassign"])))]
pub struct TransferArgs {
    /// Asset id.
    pub id: String,

    /// Collaborator id of the new owner.
    #[arg(long)]
    pub to: Option<String>,

    /// Move the asset to the unassigned pool.
    #[arg(long)]
    pub unassign: bool,
}

pub fn run_asset(command: &AssetCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        AssetCommand::List(args) => run_list(args, output),
        AssetCommand::Add(args) => run_add(args, output),
        AssetCommand::Edit(args) => run_edit(args, output),
        AssetCommand::Delete(args) => run_delete(args, output),
        AssetCommand::Transfer(args) => run_transfer(args, output),
    }
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// One tab-separated line per listing.
pub fn write_listing_rows(w: &mut dyn Write, listings: &[AssetListing<'_>]) -> std::io::Result<()> {
    for l in listings {
        let a = l.asset;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            a.id,
            a.asset_tag,
            a.name,
            a.category,
            a.status,
            date_text(a.acquisition_date),
            l.owner_label
        )?;
    }
    Ok(())
}

fn run_list(args: &ListArgs, output: OutputMode) -> anyhow::Result<()> {
    let ctx = DataContext::open(output)?;
    let term = args.search.as_deref().unwrap_or_default();
    let listings = global_assets(ctx.state(), term);

    render_mode(
        output,
        &listings,
        |rows, w| write_listing_rows(w, rows),
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No assets found");
            }
            writeln!(
                w,
                "{:<6} {:<10} {:<24} {:<14} {:<12} {}",
                "ID", "TAG", "NAME", "CATEGORY", "STATUS", "OWNER"
            )?;
            for l in rows {
                let a = l.asset;
                writeln!(
                    w,
                    "{:<6} {:<10} {:<24} {:<14} {:<12} {}",
                    a.id,
                    a.asset_tag,
                    a.name,
                    a.category,
                    a.status.to_string(),
                    l.owner_label
                )?;
            }
            Ok(())
        },
    )
}

#[derive(Debug, Serialize)]
struct AssetReport {
    id: String,
    asset_tag: String,
    name: String,
    owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested: Option<bool>,
}

fn blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn run_add(args: &AddArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;

    let mut fields = AssetFields {
        asset_tag: args.tag.trim().to_string(),
        name: args.name.trim().to_string(),
        category: args.category.clone().unwrap_or_default(),
        description: args.description.clone().unwrap_or_default(),
        acquisition_date: args.acquired,
        status: args.status,
    };

    let mut suggested = None;
    if args.suggest && (blank(args.category.as_ref()) || blank(args.description.as_ref())) {
        let suggestion = context::ai_client(&ctx.config).analyze_asset(&fields.name);
        debug!(fallback = suggestion.is_fallback(), "asset suggestion received");
        if fields.category.trim().is_empty() {
            fields.category = suggestion.category.clone();
        }
        if fields.description.trim().is_empty() {
            fields.description = suggestion.suggested_description.clone();
        }
        suggested = Some(!suggestion.is_fallback());
    }

    let id = ctx
        .session
        .add_asset(&fields, args.owner.as_deref())
        .map_err(|err| context::mutation_failure(output, &err))?;

    let report = AssetReport {
        id,
        asset_tag: fields.asset_tag,
        name: fields.name,
        owner: args.owner.clone(),
        suggested,
    };
    render(output, &report, |r, w| {
        match &r.owner {
            Some(owner) => writeln!(w, "✓ added {} ({}) as {}, owned by {owner}", r.name, r.asset_tag, r.id),
            None => writeln!(w, "✓ added {} ({}) as {}, unassigned", r.name, r.asset_tag, r.id),
        }
    })
}

fn run_edit(args: &EditArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    let Some(current) = ctx.state().asset(&args.id) else {
        return Err(fail_code(
            output,
            ErrorCode::AssetNotFound,
            format!("asset not found: {}", args.id),
        ));
    };

    let mut edited = current.clone();
    let mut fields = edited.fields();
    if let Some(name) = &args.name {
        fields.name.clone_from(name);
    }
    if let Some(tag) = &args.tag {
        fields.asset_tag.clone_from(tag);
    }
    if let Some(category) = &args.category {
        fields.category.clone_from(category);
    }
    if let Some(description) = &args.description {
        fields.description.clone_from(description);
    }
    if args.clear_acquired {
        fields.acquisition_date = None;
    } else if args.acquired.is_some() {
        fields.acquisition_date = args.acquired;
    }
    if let Some(status) = args.status {
        fields.status = status;
    }
    edited.apply(fields);

    ctx.session
        .edit_asset(&edited)
        .map_err(|err| context::mutation_failure(output, &err))?;

    let report = AssetReport {
        id: edited.id,
        asset_tag: edited.asset_tag,
        name: edited.name,
        owner: edited.collaborator_id,
        suggested: None,
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ updated {} ({})", r.name, r.asset_tag)
    })
}

#[derive(Debug, Serialize)]
struct DeleteReport {
    id: String,
    asset_tag: String,
    name: String,
}

fn run_delete(args: &DeleteArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    let Some(target) = ctx.state().asset(&args.id) else {
        return Err(fail_code(
            output,
            ErrorCode::AssetNotFound,
            format!("asset not found: {}", args.id),
        ));
    };
    let report = DeleteReport {
        id: target.id.clone(),
        asset_tag: target.asset_tag.clone(),
        name: target.name.clone(),
    };

    let prompt = format!("Delete {} ({})?", report.name, report.asset_tag);
    if !confirmed(args.yes, &prompt)? {
        return Err(fail_code(
            output,
            ErrorCode::InvalidInput,
            "deletion not confirmed; pass --yes to delete without a prompt",
        ));
    }

    ctx.session
        .delete_asset(&args.id)
        .map_err(|err| context::mutation_failure(output, &err))?;

    render(output, &report, |r, w| {
        writeln!(w, "✓ deleted {} ({})", r.name, r.asset_tag)
    })
}

#[derive(Debug, Serialize)]
struct TransferReport {
    id: String,
    from: Option<String>,
    to: Option<String>,
}

fn run_transfer(args: &TransferArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut ctx = DataContext::open(output)?;
    let from = ctx
        .state()
        .asset(&args.id)
        .and_then(|a| a.collaborator_id.clone());
    let to = if args.unassign { None } else { args.to.clone() };

    ctx.session
        .transfer_asset(&args.id, to.as_deref())
        .map_err(|err| context::mutation_failure(output, &err))?;

    let report = TransferReport {
        id: args.id.clone(),
        from,
        to,
    };
    render(output, &report, |r, w| match &r.to {
        Some(owner) => writeln!(w, "✓ asset {} now held by {owner}", r.id),
        None => writeln!(w, "✓ asset {} returned to the unassigned pool", r.id),
    })
}
