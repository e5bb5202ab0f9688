//! Logic modules: translate a selection into an ordered, duplicate-free plan.
//!
//! # Modules
//!
//! - `graph`: priority topological sort with cycle reporting
//! - `resolver`: dependency closure and ordering
//! - `dedup`: collapses repeated demands into single plan nodes

pub mod dedup;
pub mod graph;
pub mod resolver;
