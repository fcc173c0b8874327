//! `pt suggest` and `pt audit` — the optional AI assistant.
//!
//! Both degrade to fixed fallbacks when no key is configured or the service
//! fails; neither command errors for that reason.

use clap::Args;
use patrimonio_core::model::AssetSuggestion;
use patrimonio_remote::suggest::distribution_summary;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

use crate::context::{self, DataContext};
use crate::output::{OutputMode, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Asset name to analyse, e.g. "Dell Latitude 5440".
    pub name: String,
}

#[derive(Debug, Serialize)]
struct SuggestReport {
    name: String,
    #[serde(flatten)]
    suggestion: AssetSuggestion,
    fallback: bool,
}

pub fn run_suggest(args: &SuggestArgs, output: OutputMode) -> anyhow::Result<()> {
    let config = context::load_config(output)?;
    let client = context::ai_client(&config);
    if !client.has_key() {
        warn!("no AI key configured; returning the fallback suggestion");
    }
    let suggestion = client.analyze_asset(&args.name);
    let report = SuggestReport {
        name: args.name.clone(),
        fallback: suggestion.is_fallback(),
        suggestion,
    };

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}",
                r.suggestion.category,
                r.suggestion.estimated_value_tier,
                r.suggestion.suggested_description
            )
        },
        |r, w| {
            pretty_section(w, &format!("Suggestion for {}", r.name))?;
            pretty_kv(w, "Category", &r.suggestion.category)?;
            pretty_kv(w, "Value tier", r.suggestion.estimated_value_tier.to_string())?;
            pretty_kv(w, "Description", &r.suggestion.suggested_description)?;
            if r.fallback {
                writeln!(w, "(assistant unavailable; default values shown)")?;
            }
            Ok(())
        },
    )
}

#[derive(Debug, Serialize)]
struct AuditReport {
    report: String,
}

pub fn run_audit(output: OutputMode) -> anyhow::Result<()> {
    let ctx = DataContext::open(output)?;
    let distribution = distribution_summary(ctx.state());
    let report = AuditReport {
        report: context::ai_client(&ctx.config).audit_report(&distribution),
    };
    render(output, &report, |r, w| writeln!(w, "{}", r.report))
}
