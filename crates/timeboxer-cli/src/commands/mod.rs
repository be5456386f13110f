pub mod plan;
pub mod rule;
pub mod task;
