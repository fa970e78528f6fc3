use super::{ClassifyOutcome, Scenario, ScenarioStep, ScriptedCandidate};
use crate::recognition::{
    ClassifierState, CommandClassifier, CommandId, ProcessedChunk, RankedCommand,
    RecognitionError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PhraseEntry {
    command_id: CommandId,
    phrase_id: usize,
    phrase: String,
}

/// Classifier that reports the outcomes a scenario scripts for each chunk.
///
/// Like a real phrase model it keeps its own listening timer: after
/// `timeout_ms` of audio without a scripted result it reports a timeout.
pub struct ScriptedClassifier {
    steps: Vec<ScenarioStep>,
    chunk_samples: usize,
    timeout_samples: u64,
    listened_samples: u64,
    pending: Vec<(CommandId, String)>,
    table: Vec<PhraseEntry>,
}

impl ScriptedClassifier {
    pub fn new(scenario: &Scenario, chunk_samples: usize, sample_rate: u32, timeout_ms: u64) -> Self {
        Self {
            steps: scenario.expanded(),
            chunk_samples,
            timeout_samples: timeout_ms * u64::from(sample_rate) / 1000,
            listened_samples: 0,
            pending: Vec::new(),
            table: Vec::new(),
        }
    }

    /// Compiled phrases in registration order.
    pub fn phrases(&self) -> impl Iterator<Item = (CommandId, &str)> {
        self.table.iter().map(|entry| (entry.command_id, entry.phrase.as_str()))
    }

    fn resolve(&self, candidate: &ScriptedCandidate) -> Option<RankedCommand> {
        let entry = match (candidate.command, candidate.phrase.as_deref()) {
            (Some(id), _) => self.table.iter().find(|entry| entry.command_id == id),
            (None, Some(phrase)) => self
                .table
                .iter()
                .find(|entry| entry.phrase.eq_ignore_ascii_case(phrase.trim())),
            (None, None) => None,
        };
        match entry {
            Some(entry) => Some(RankedCommand {
                command_id: entry.command_id,
                phrase_id: entry.phrase_id,
                probability: candidate.probability,
            }),
            None => {
                tracing::warn!(?candidate, "scripted candidate matches no registered phrase");
                None
            }
        }
    }

    fn ranked(&self, candidates: &[ScriptedCandidate]) -> Option<ClassifierState> {
        let mut ranked: Vec<RankedCommand> =
            candidates.iter().filter_map(|c| self.resolve(c)).collect();
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        let mut ranked = ranked.into_iter();
        let best = ranked.next()?;
        Some(ClassifierState::Detected {
            best,
            alternatives: ranked.collect(),
        })
    }
}

impl CommandClassifier for ScriptedClassifier {
    fn chunk_size(&self) -> usize {
        self.chunk_samples
    }

    fn reset_phrases(&mut self) -> Result<(), RecognitionError> {
        self.pending.clear();
        self.table.clear();
        Ok(())
    }

    fn add_phrase(&mut self, id: CommandId, phrase: &str) -> Result<(), RecognitionError> {
        self.pending.push((id, phrase.to_string()));
        Ok(())
    }

    fn update_phrases(&mut self) -> Result<(), RecognitionError> {
        let mut table: Vec<PhraseEntry> = Vec::with_capacity(self.pending.len());
        for (command_id, phrase) in &self.pending {
            let phrase = phrase.trim();
            if phrase.is_empty() {
                return Err(RecognitionError::PhraseTable(format!(
                    "command {command_id} has an empty phrase"
                )));
            }
            let phrase_id = table
                .iter()
                .filter(|entry| entry.command_id == *command_id)
                .count();
            table.push(PhraseEntry {
                command_id: *command_id,
                phrase_id,
                phrase: phrase.to_string(),
            });
        }
        self.table = table;
        Ok(())
    }

    fn detect(&mut self, chunk: &ProcessedChunk) -> ClassifierState {
        let scripted = self
            .steps
            .get(chunk.sequence as usize)
            .and_then(|step| match step.classify {
                ClassifyOutcome::Detecting => None,
                ClassifyOutcome::Timeout => Some(ClassifierState::Timeout),
                ClassifyOutcome::Detected => self.ranked(&step.candidates),
            });
        if let Some(state) = scripted {
            self.listened_samples = 0;
            return state;
        }

        self.listened_samples += chunk.samples.len() as u64;
        if self.listened_samples >= self.timeout_samples {
            self.listened_samples = 0;
            return ClassifierState::Timeout;
        }
        ClassifierState::Detecting
    }
}
