//! # Controller
//!
//! - `reconciler`: the reconciliation engine

pub mod reconciler;
