//! Health metrics: win coverage, profit sufficiency, exposure, drawdown velocity.

mod engine;

pub use engine::{DrawdownState, MetricSnapshot, MetricsEngine};
