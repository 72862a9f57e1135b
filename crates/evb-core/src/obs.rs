//! Structured observability hooks for the per-target reconciliation cycle.
//!
//! This module provides:
//! - A target-scoped tracing span for instrumenting the reconcile future
//! - Emission functions for lifecycle events: start, PR created/closed,
//!   branch deleted, finish and failure
//!
//! Events are emitted at `info!` level; failures at `warn!`.

use tracing::info;

/// Span covering the reconciliation of one update target.
///
/// # Example
///
/// ```ignore
/// reconciler.reconcile(&subject, candidate).instrument(target_span("editor")).await
/// // every event inside carries target = "editor"
/// ```
pub fn target_span(target: &str) -> tracing::Span {
    tracing::info_span!("evb.target", target = %target)
}

/// Emit event: reconciliation of a target started.
pub fn emit_target_started(target: &str, current: &str, candidate: Option<&str>) {
    info!(
        event = "target.started",
        target = %target,
        current = %current,
        candidate = candidate.unwrap_or("none"),
    );
}

/// Emit event: bot pull requests found for a target.
pub fn emit_pull_requests_found(target: &str, count: usize) {
    info!(event = "target.pull_requests_found", target = %target, count = count);
}

/// Emit event: a dangling bot branch was deleted.
pub fn emit_branch_deleted(branch: &str) {
    info!(event = "branch.deleted", branch = %branch);
}

/// Emit event: a bot pull request was closed.
pub fn emit_pr_closed(target: &str, number: u64, reason: &str) {
    info!(event = "pr.closed", target = %target, number = number, reason = %reason);
}

/// Emit event: a bump pull request was opened.
pub fn emit_pr_created(target: &str, number: u64, branch: &str) {
    info!(event = "pr.created", target = %target, number = number, branch = %branch);
}

/// Emit event: reconciliation of a target finished.
pub fn emit_target_finished(target: &str, outcome: &str, duration_ms: u64) {
    info!(
        event = "target.finished",
        target = %target,
        outcome = %outcome,
        duration_ms = duration_ms,
    );
}

/// Emit event: reconciliation of a target failed (warning level).
pub fn emit_target_failed(target: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "target.failed", target = %target, error = %error);
}
