//! `pt dashboard` — totals and the top-usage chart.

use patrimonio_core::projection::{DashboardSummary, UsageBar, dashboard};
use std::io::{self, Write};

use crate::context::DataContext;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

const BAR_WIDTH: usize = 40;

/// Bar length for `value`, scaled so that `max` fills [`BAR_WIDTH`].
fn bar_len(value: usize, max: usize) -> usize {
    if max == 0 {
        return 0;
    }
    (value * BAR_WIDTH).div_ceil(max)
}

fn write_chart(w: &mut dyn Write, bars: &[UsageBar]) -> io::Result<()> {
    let max = bars.iter().map(|b| b.assets).max().unwrap_or(0);
    let label_width = bars.iter().map(|b| b.username.len()).max().unwrap_or(0);
    for bar in bars {
        writeln!(
            w,
            "{:<label_width$}  {} {}",
            bar.username,
            "#".repeat(bar_len(bar.assets, max)),
            bar.assets
        )?;
    }
    Ok(())
}

pub fn run_dashboard(output: OutputMode) -> anyhow::Result<()> {
    let ctx = DataContext::open(output)?;
    let summary = dashboard(ctx.state());

    render_mode(
        output,
        &summary,
        |s: &DashboardSummary, w| {
            writeln!(w, "collaborators\t{}", s.collaborators)?;
            writeln!(w, "assigned\t{}", s.assigned_assets)?;
            writeln!(w, "unassigned\t{}", s.unassigned_assets)?;
            writeln!(w, "total\t{}", s.total_assets)?;
            for bar in &s.top {
                writeln!(w, "top\t{}\t{}", bar.username, bar.assets)?;
            }
            Ok(())
        },
        |s: &DashboardSummary, w| {
            pretty_section(w, "Dashboard")?;
            pretty_kv(w, "Collaborators", s.collaborators.to_string())?;
            pretty_kv(w, "Assigned", s.assigned_assets.to_string())?;
            pretty_kv(w, "Unassigned", s.unassigned_assets.to_string())?;
            pretty_kv(w, "Total", s.total_assets.to_string())?;
            writeln!(w)?;
            pretty_section(w, "Assets per collaborator")?;
            if s.top.is_empty() {
                return writeln!(w, "No assets assigned yet");
            }
            write_chart(w, &s.top)
        },
    )
}
