use crate::recognition::{CommandId, WakeState};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyOutcome {
    /// Keep listening; the classifier's own timeout still runs.
    #[default]
    Detecting,
    Timeout,
    /// Report `candidates`, best first after sorting by probability.
    Detected,
}

/// A recognised command named either by id or by one of its phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedCandidate {
    #[serde(default)]
    pub command: Option<CommandId>,
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default = "default_probability")]
    pub probability: f32,
}

/// Upper bound on one step's `repeat`.
pub const MAX_STEP_REPEAT: usize = 100_000;

/// Upper bound on the chunks a whole scenario describes once expanded.
pub const MAX_SCENARIO_CHUNKS: usize = 1_000_000;

fn default_probability() -> f32 {
    1.0
}

fn default_repeat() -> usize {
    1
}

/// What the services report for one fetched chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioStep {
    #[serde(default)]
    pub wake: WakeState,
    /// Trigger channel reported with `channel_verified`.
    #[serde(default)]
    pub channel: Option<usize>,
    #[serde(default)]
    pub classify: ClassifyOutcome,
    #[serde(default)]
    pub candidates: Vec<ScriptedCandidate>,
    /// Fetch fails with this reason instead of producing a chunk.
    #[serde(default)]
    pub fault: Option<String>,
    /// Number of consecutive chunks this step describes.
    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

impl Default for ScenarioStep {
    fn default() -> Self {
        Self {
            wake: WakeState::NoDetect,
            channel: None,
            classify: ClassifyOutcome::Detecting,
            candidates: Vec::new(),
            fault: None,
            repeat: default_repeat(),
        }
    }
}

/// Ordered script; step *n* describes the *n*-th fetched chunk once
/// `repeat` counts are expanded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Load from JSON when the extension says so, YAML otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };
        scenario.with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text).context("failed to parse YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(text).context("failed to parse JSON")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if !(1..=MAX_STEP_REPEAT).contains(&step.repeat) {
                bail!(
                    "step {index}: repeat must be between 1 and {MAX_STEP_REPEAT}, got {}",
                    step.repeat
                );
            }
            if step.classify == ClassifyOutcome::Detected && step.candidates.is_empty() {
                bail!("step {index}: a detected outcome needs at least one candidate");
            }
            if step.classify != ClassifyOutcome::Detected && !step.candidates.is_empty() {
                bail!("step {index}: candidates are only used with `classify: detected`");
            }
            for candidate in &step.candidates {
                if candidate.command.is_some() == candidate.phrase.is_some() {
                    bail!("step {index}: each candidate names exactly one of `command` or `phrase`");
                }
                if !(0.0..=1.0).contains(&candidate.probability) {
                    bail!(
                        "step {index}: probability {} is outside 0..=1",
                        candidate.probability
                    );
                }
            }
        }
        let chunks: usize = self.steps.iter().map(|step| step.repeat).sum();
        if chunks > MAX_SCENARIO_CHUNKS {
            bail!("scenario describes {chunks} chunks; at most {MAX_SCENARIO_CHUNKS} are supported");
        }
        Ok(())
    }

    /// One entry per fetched chunk.
    pub fn expanded(&self) -> Vec<ScenarioStep> {
        self.steps
            .iter()
            .flat_map(|step| {
                let single = ScenarioStep {
                    repeat: 1,
                    ..step.clone()
                };
                std::iter::repeat(single).take(step.repeat)
            })
            .collect()
    }
}
