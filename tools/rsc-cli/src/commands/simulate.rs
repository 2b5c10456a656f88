//! Scripted navigation sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use rsc_core::{Location, NavigationKey};
use rsc_fetch::{HandleState, ScriptedFetcher};
use rsc_navigation::{
    HistoryEntry, HistoryStore, MemoryHistory, NavigateOptions, NavigationController, NavigationOutcome,
    PendingNavigation, RouterSnapshot,
};
use rsc_observability::{MetricsSnapshot, NavigationMetrics};
use serde::Serialize;
use tokio::sync::mpsc;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::{format_micros, outcome_badge};
use crate::script::{Script, Step};

type Navigator = NavigationController<ScriptedFetcher, MemoryHistory>;

/// Result of one step.
#[derive(Debug, Serialize)]
struct StepResult {
    step: usize,
    op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<NavigationKey>,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    steps: Vec<StepResult>,
    history: Vec<HistoryEntry>,
    history_index: usize,
    snapshot: RouterSnapshot,
    active_content: String,
    cache_keys: Vec<NavigationKey>,
    renders: usize,
    metrics: MetricsSnapshot,
}

struct Session {
    nav: Navigator,
    history: Arc<MemoryHistory>,
    outstanding: Vec<(usize, String, PendingNavigation)>,
    results: Vec<StepResult>,
    fail_fast: bool,
}

impl Session {
    async fn run_step(&mut self, index: usize, step: &Step, ctx: &Context) -> Result<()> {
        let op = step.describe();
        match step {
            Step::Navigate { to, wait } => {
                let pending = self.nav.navigate(to, NavigateOptions::push())?;
                self.track(index, op, pending, *wait).await?;
            }
            Step::Replace { to, wait } => {
                let pending = self.nav.navigate(to, NavigateOptions::replace())?;
                self.track(index, op, pending, *wait).await?;
            }
            Step::Back { wait } => match self.history.back() {
                Some(_) => {
                    let pending = self.nav.handle_pop_event()?;
                    self.track(index, op, pending, *wait).await?;
                }
                None => self.skip(index, op, "already at the first entry", ctx),
            },
            Step::Forward { wait } => match self.history.forward() {
                Some(_) => {
                    let pending = self.nav.handle_pop_event()?;
                    self.track(index, op, pending, *wait).await?;
                }
                None => self.skip(index, op, "already at the last entry", ctx),
            },
            Step::Action { id, args } => {
                let key = self.history.current().key;
                match self.nav.call_server(id, args).await {
                    Ok(value) => self.results.push(StepResult {
                        step: index,
                        op,
                        key,
                        outcome: "committed".to_string(),
                        detail: Some(value.to_string()),
                    }),
                    Err(e) if self.fail_fast => {
                        return Err(e).with_context(|| format!("Action {} failed", id));
                    }
                    Err(e) => {
                        ctx.output.warn(&format!("Action {} failed: {}", id, e));
                        self.results.push(StepResult {
                            step: index,
                            op,
                            key,
                            outcome: "failed".to_string(),
                            detail: Some(e.to_string()),
                        });
                    }
                }
            }
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Settle => self.settle().await?,
        }
        Ok(())
    }

    async fn track(
        &mut self,
        index: usize,
        op: String,
        pending: PendingNavigation,
        wait: bool,
    ) -> Result<()> {
        if wait {
            let outcome = pending.outcome().await?;
            self.record(index, op, outcome);
        } else {
            self.outstanding.push((index, op, pending));
        }
        Ok(())
    }

    fn skip(&mut self, index: usize, op: String, reason: &str, ctx: &Context) {
        ctx.output.warn(&format!("Skipping {}: {}", op, reason));
        self.results.push(StepResult {
            step: index,
            op,
            key: None,
            outcome: "skipped".to_string(),
            detail: Some(reason.to_string()),
        });
    }

    async fn settle(&mut self) -> Result<()> {
        for (index, op, pending) in std::mem::take(&mut self.outstanding) {
            let outcome = pending.outcome().await?;
            self.record(index, op, outcome);
        }
        self.results.sort_by_key(|r| r.step);
        Ok(())
    }

    fn record(&mut self, index: usize, op: String, outcome: NavigationOutcome) {
        let key = Some(outcome.key().clone());
        let (label, detail) = match outcome {
            NavigationOutcome::Committed { location, .. } => {
                ("committed", Some(location.to_string()))
            }
            NavigationOutcome::Superseded { .. } => ("superseded", None),
            NavigationOutcome::Failed { error, .. } => ("failed", Some(error.to_string())),
        };
        self.results.push(StepResult {
            step: index,
            op,
            key,
            outcome: label.to_string(),
            detail,
        });
    }
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.script);
    let script = Script::load(&path)?;
    ctx.output.debug(&format!(
        "Loaded {} steps from {}",
        script.steps.len(),
        path.display()
    ));

    let fetcher = Arc::new(script.fetcher()?);
    let history = Arc::new(MemoryHistory::new(Location::parse(&script.start)?));
    let metrics = Arc::new(NavigationMetrics::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let nav = NavigationController::builder(ctx.config.clone(), fetcher, history.clone())
        .with_observer(metrics.clone())
        .with_render(move |event| {
            let _ = tx.send(event);
        })
        .start()?;

    if let Err(e) = nav.read_active().await {
        ctx.output.warn(&format!("Initial load failed: {}", e));
    }

    let mut session = Session {
        nav: nav.clone(),
        history: history.clone(),
        outstanding: Vec::new(),
        results: Vec::new(),
        fail_fast: args.fail_fast,
    };

    let total = script.steps.len();
    for (i, step) in script.steps.iter().enumerate() {
        ctx.output.step(i + 1, total, &step.describe());
        session.run_step(i + 1, step, ctx).await?;
    }
    session.settle().await?;

    let mut renders = 0;
    while rx.try_recv().is_ok() {
        renders += 1;
    }

    let active_content = match nav.active_content()?.state() {
        HandleState::Pending => "pending".to_string(),
        HandleState::Resolved(content) => content
            .root_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{} bytes>", content.root.len())),
        HandleState::Failed(e) => format!("error: {}", e),
    };

    let report = SimulationReport {
        steps: session.results,
        history: history.entries(),
        history_index: history.index(),
        snapshot: nav.snapshot(),
        active_content,
        cache_keys: nav.cache_keys(),
        renders,
        metrics: metrics.snapshot(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        print_report(&report, ctx);
    }

    Ok(())
}

fn print_report(report: &SimulationReport, ctx: &Context) {
    let out = &ctx.output;

    out.header("Steps");
    for result in &report.steps {
        let step = format!("#{}", result.step);
        let badge = outcome_badge(&result.outcome);
        let detail = result.detail.as_deref().unwrap_or("");
        out.table_row(&[&step, &result.op, &badge, detail], &[4, 20, 12, 0]);
    }

    out.header("History");
    for (i, entry) in report.history.iter().enumerate() {
        let marker = if i == report.history_index { ">" } else { " " };
        let key = entry
            .key
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.table_row(&[marker, entry.location.as_str(), &key], &[1, 24, 0]);
    }

    out.header("Router");
    out.kv("location", report.snapshot.router.location.as_str());
    out.kv("active_key", report.snapshot.active_key.as_str());
    out.kv("active_content", &report.active_content);
    out.kv("epoch", &report.snapshot.epoch.to_string());
    out.kv("cache_entries", &report.cache_keys.len().to_string());
    out.kv("renders", &report.renders.to_string());

    let metrics = &report.metrics;
    out.header("Metrics");
    out.kv("started", &metrics.started.to_string());
    out.kv("committed", &metrics.committed.to_string());
    out.kv("superseded", &metrics.superseded.to_string());
    out.kv("failed", &metrics.failed.to_string());
    out.kv("pops", &metrics.pops.to_string());
    out.kv("actions", &metrics.actions.to_string());
    if let (Some(mean), Some(max)) = (metrics.mean_commit_us, metrics.max_commit_us) {
        out.kv(
            "commit latency",
            &format!("mean {}, max {}", format_micros(mean), format_micros(max)),
        );
    }
}
