//! `show` – one progress line per job, in insertion order.

use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use mdt_core::progress::format_eta;
use mdt_core::router::Handler;
use mdt_core::{Flow, JobSnapshot, Stage};

use super::expect_no_args;
use crate::cli::shell::Shell;

const FILLERS: [char; 2] = ['·', '-'];
const ELLIPSIS: &str = "...";

pub struct Show;

#[async_trait]
impl Handler<Shell> for Show {
    fn description(&self) -> &str {
        "Show progress for all jobs"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        print_jobs(ctx);
        Ok(Flow::Continue)
    }
}

/// Render every job of the shell to stdout.
pub fn print_jobs(ctx: &Shell) {
    let rows = ctx.jobs.jobs().iter().map(|j| (j.name(), j.snapshot()));
    print!("{}", render_rows(rows, ctx.config.name_display_width, Instant::now()));
}

/// Render `(name, snapshot)` rows. Names are cut or padded to `width`, the
/// padding character alternating between rows so long lines stay readable.
pub fn render_rows(
    rows: impl IntoIterator<Item = (String, JobSnapshot)>,
    width: usize,
    now: Instant,
) -> String {
    let mut out = String::new();
    for ((name, snapshot), filler) in rows.into_iter().zip(FILLERS.iter().cycle()) {
        out.push_str(&fit_name(&name, width, *filler));
        out.push(*filler);
        out.push_str(&status(&snapshot, now));
        out.push('\n');
    }
    out
}

fn fit_name(name: &str, width: usize, filler: char) -> String {
    let len = name.chars().count();
    if len > width {
        let kept: String = name.chars().take(width.saturating_sub(ELLIPSIS.len())).collect();
        kept + ELLIPSIS
    } else {
        let mut fitted = name.to_string();
        fitted.extend(std::iter::repeat(filler).take(width - len));
        fitted
    }
}

fn status(snapshot: &JobSnapshot, now: Instant) -> String {
    match snapshot.stage {
        Stage::Error => "ERR".to_string(),
        Stage::Done => "Done".to_string(),
        Stage::PostProcess => "postprocess".to_string(),
        Stage::Download => {
            let progress = &snapshot.progress;
            let eta = progress
                .eta(now)
                .map(format_eta)
                .unwrap_or_else(|| "--:--".to_string());
            format!("{:.1}% (ETA {})", progress.current_progress() * 100.0, eta)
        }
    }
}
