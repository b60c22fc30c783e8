//! Background Tasks Module
//!
//! Contains the sweep scheduler that runs independently of caller threads:
//! TTL expiry removal, limit re-enforcement and statistics refresh at a
//! configurable interval.

mod sweep;

pub use sweep::spawn_sweep_task;
