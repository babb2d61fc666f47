mod event_hub;
mod events;
mod mode;
mod options;
mod registry;
mod runner;
mod state;
mod steps;
mod summary;

pub use event_hub::{EventHub, EventSubscription, SubscriptionId};
pub use events::EngineEvent;
pub use mode::ExecutionMode;
pub use options::{RunAllOptions, RunOptions};
pub use registry::ScenarioRegistry;
pub use runner::QaEngine;
pub use state::{EngineState, StepResult};
pub use summary::{BatchEntry, BatchSummary, ScenarioSummary, summarize};
