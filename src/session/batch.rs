use rayon::prelude::*;

use crate::foundation::error::{ReelError, ReelResult};
use crate::project::layout::ProjectInputs;
use crate::session::job::{JobContext, JobPlan, JobReport, JobVariant, plan_job, run_job};
use crate::session::telemetry::JobTelemetry;

/// Batch runner settings.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Worker threads; `None` uses rayon's default.
    pub jobs: Option<usize>,
    /// Only this language (name or code).
    pub language: Option<String>,
    /// Level for per-project log files when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: None,
            language: None,
            log_level: "info".to_string(),
        }
    }
}

/// A job that did not produce output.
#[derive(Clone, Debug)]
pub struct JobFailure {
    /// Project name.
    pub project: String,
    /// Variant label.
    pub variant: String,
    /// Rendered error message.
    pub error: String,
    /// Whether the job was stopped by cancellation.
    pub cancelled: bool,
}

impl JobFailure {
    fn new(project: &ProjectInputs, variant: &JobVariant, e: &ReelError) -> Self {
        tracing::error!(project = %project.name, variant = variant.label(), fatal = e.is_job_fatal(), error = %e, "job failed");
        Self {
            project: project.name.clone(),
            variant: variant.label().to_string(),
            cancelled: matches!(e, ReelError::Cancelled),
            error: e.to_string(),
        }
    }
}

/// Results of a batch, in project then language order.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// Finished jobs.
    pub succeeded: Vec<JobReport>,
    /// Failed jobs.
    pub failed: Vec<JobFailure>,
}

impl BatchReport {
    /// Total number of jobs attempted.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Run every variant of every project on a rayon pool.
///
/// A failing job is logged and recorded; it never stops sibling jobs. The returned error
/// covers only setup problems (bad language filter, thread pool creation).
#[tracing::instrument(skip_all, fields(projects = projects.len()))]
pub fn run_batch(
    ctx: &JobContext,
    projects: &[ProjectInputs],
    opts: &BatchOptions,
) -> ReelResult<BatchReport> {
    let variants = ctx.variants(opts.language.as_deref())?;
    let layout = ctx.layout();

    let telemetry: Vec<Option<JobTelemetry>> = projects
        .iter()
        .map(
            |p| match JobTelemetry::open(layout.log_root(), &p.name, &opts.log_level) {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!(project = %p.name, error = %e, "project log file unavailable");
                    None
                }
            },
        )
        .collect();

    let tasks: Vec<(usize, &JobVariant)> = (0..projects.len())
        .flat_map(|i| variants.iter().map(move |v| (i, v)))
        .collect();
    tracing::info!(jobs = tasks.len(), "batch started");

    let pool = build_pool(opts.jobs)?;
    let results: Vec<Result<JobReport, JobFailure>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|&(i, variant)| {
                let project = &projects[i];
                let run = || {
                    run_job(ctx, project, variant)
                        .map_err(|e| JobFailure::new(project, variant, &e))
                };
                match &telemetry[i] {
                    Some(t) => t.scope(run),
                    None => run(),
                }
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(done) => report.succeeded.push(done),
            Err(failed) => report.failed.push(failed),
        }
    }
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

/// Plans for the variants of one project.
#[derive(Clone, Debug, Default)]
pub struct PlanReport {
    /// Variants that resolved.
    pub plans: Vec<JobPlan>,
    /// Variants that did not.
    pub failed: Vec<JobFailure>,
}

/// Plan every variant of `project` in order. A failing variant is recorded and the
/// remaining variants are still planned.
pub fn plan_project(
    ctx: &JobContext,
    project: &ProjectInputs,
    variants: &[JobVariant],
) -> PlanReport {
    let mut report = PlanReport::default();
    for variant in variants {
        match plan_job(ctx, project, variant) {
            Ok(plan) => report.plans.push(plan),
            Err(e) => report.failed.push(JobFailure::new(project, variant, &e)),
        }
    }
    report
}

fn build_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/batch.rs"]
mod tests;
