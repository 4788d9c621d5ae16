//! Realistic IDE workload benchmarks.
//!
//! These scenarios drive a bus the way the client does: many sources, a mix of
//! scoped and unscoped handlers, and handlers coming and going while events
//! keep flowing.
//!
//! # Scenarios
//!
//! - **Editor session**: per-document panes, shared status handlers, keystroke and snapshot traffic
//! - **Churn**: random register / unregister interleaved with fires

pub mod churn;
pub mod editor_session;

pub use churn::{ChurnConfig, ChurnScenario};
pub use editor_session::{EditorSessionConfig, EditorSessionScenario};

/// Common trait for benchmark scenarios.
pub trait Scenario {
    /// Human-readable name of the scenario.
    fn name(&self) -> &'static str;

    /// Brief description of what this scenario tests.
    fn description(&self) -> &'static str;

    /// Number of live handler registrations.
    fn handler_count(&self) -> usize;

    /// Set up the scenario (create the bus, register handlers).
    fn setup(&mut self);

    /// Run one round of traffic.
    fn update(&mut self);

    /// Remove every registration.
    fn teardown(&mut self);
}
