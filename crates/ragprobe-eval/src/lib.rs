#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Failure classification, metrics, recommendations and the two-pass
//! evaluation engine.

pub mod classifier;
pub mod engine;
pub mod metrics;
pub mod recommendations;

pub use classifier::classify;
pub use engine::{Evaluator, Pass, PassObserver};
pub use metrics::{aggregate, compare, estimate_tokens, MetricDelta, MetricsComparison};
pub use recommendations::recommend;
