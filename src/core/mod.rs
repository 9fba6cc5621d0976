//! Core enforcement engine: data model, apply algorithm, scheduler.

pub mod affinity;
pub mod rules;
pub mod scheduler;
