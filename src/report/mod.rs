//! Turns a completed session's samples into a sleep-quality report:
//! per-stage time, efficiency, latencies, WASO, disruption counts, the
//! composite score, and rule-based recommendations.

mod aggregator;
mod recommendations;
mod scoring;

pub use aggregator::aggregate;
