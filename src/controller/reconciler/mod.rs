//! # Reconciler
//!
//! Converges InfluxDB tokens and their Kubernetes Secrets toward the
//! declared desired state.
//!
//! - `diff`: pure desired vs. observed comparison
//! - `inventory`: per-run snapshot of InfluxDB orgs, buckets and tokens
//! - `resolver`: get-or-create of org, bucket and token for one entry
//! - `reconcile`: orchestration of a single run

pub mod diff;
pub mod inventory;
pub mod reconcile;
pub mod resolver;
pub mod types;

pub use diff::{dedupe_desired, diff, Diff};
pub use inventory::{fetch_inventory, DirectoryState};
pub use reconcile::{run, Reconciler};
pub use resolver::{Resolution, Resolver, TokenOutcome};
pub use types::{EntryFailure, FailureStage, ReconcileOptions, RunReport};
