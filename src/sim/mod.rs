//! Scenario-driven stand-ins for the speech-model services.
//!
//! A [`Scenario`] lists, chunk by chunk, what the wake-word detector and the
//! command classifier report. [`ScriptedFrontEnd`] and [`ScriptedClassifier`]
//! replay it so the whole pipeline runs on a development host.

mod classifier;
mod frontend;
mod scenario;

pub use classifier::ScriptedClassifier;
pub use frontend::{ScriptedFrontEnd, DEFAULT_RING_CHUNKS};
pub use scenario::{
    ClassifyOutcome, Scenario, ScenarioStep, ScriptedCandidate, MAX_SCENARIO_CHUNKS, MAX_STEP_REPEAT,
};
