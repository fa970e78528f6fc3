use super::{CommandEvent, CommandPublisher};
use crate::recognition::RecognitionEngine;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One voice command as written in a command set file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub phrases: Vec<String>,
    /// Display text; defaults to the first phrase.
    #[serde(default)]
    pub message: Option<String>,
    /// Event id published when the command fires.
    #[serde(default)]
    pub event: Option<String>,
}

impl CommandSpec {
    fn new(phrases: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            message: None,
            event: None,
        }
    }

    pub fn event_id(&self) -> String {
        match (&self.event, self.phrases.first()) {
            (Some(event), _) => event.clone(),
            (None, Some(first)) => event_id_for(first),
            (None, None) => String::new(),
        }
    }
}

/// Event id derived from a command name: lowercase, underscores, `_event`.
pub fn event_id_for(name: &str) -> String {
    let mut id: String = name
        .trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    id.push_str("_event");
    id
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSet {
    pub commands: Vec<CommandSpec>,
}

impl CommandSet {
    /// Lights, colours and media controls the satellite ships with.
    pub fn default_set() -> Self {
        let commands: [&[&str]; 18] = [
            &["Toggle the Light", "Light"],
            &["Turn On the Light", "Switch On the Light"],
            &["Turn Off the Light", "Switch Off the Light"],
            &["Turn White"],
            &["Turn Warm White"],
            &["Turn Red"],
            &["Turn Green"],
            &["Turn Blue"],
            &["Turn Pink"],
            &["Tiny Light", "Turn On the Tiny Light"],
            &["Play Cartoons", "Cartoons"],
            &["Play Music", "Music"],
            &["Play"],
            &["Pause"],
            &["Resume"],
            &["Stop"],
            &["Mute"],
            &["Unmute"],
        ];
        Self {
            commands: commands.into_iter().map(CommandSpec::new).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read command set {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid command set {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let set: CommandSet = serde_yaml::from_str(text).context("failed to parse YAML")?;
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        if self.commands.is_empty() {
            bail!("command set is empty");
        }
        let mut events = HashSet::new();
        for (index, spec) in self.commands.iter().enumerate() {
            if spec.phrases.is_empty() {
                bail!("command {index} has no phrases");
            }
            if spec.phrases.iter().any(|p| p.trim().is_empty()) {
                bail!("command {index} has a blank phrase");
            }
            let event = spec.event_id();
            if !events.insert(event.clone()) {
                bail!("command {index} reuses event id {event}");
            }
        }
        Ok(())
    }
}

/// Register every command of `set`, binding each to a published event.
pub fn register_commands(
    engine: &mut RecognitionEngine,
    set: &CommandSet,
    publisher: Arc<dyn CommandPublisher>,
) -> Result<()> {
    engine
        .begin_add_commands()
        .context("failed to open command registration")?;
    for spec in &set.commands {
        let command_id = engine.commands().len();
        let event = CommandEvent::voice_command(spec.event_id(), command_id);
        let publisher = publisher.clone();
        let registered = engine
            .add_command(
                spec.phrases.iter().cloned(),
                move || publisher.publish(&event),
                spec.message.as_deref(),
            )
            .with_context(|| format!("failed to register command {:?}", spec.phrases))?;
        debug_assert_eq!(registered, command_id);
    }
    engine
        .end_add_commands()
        .context("failed to finalize command registration")?;
    Ok(())
}
