use super::*;
use crate::audio::{AudioFormat, SilenceCapture, SoundCues};
use crate::event_loop::EventLoop;
use crate::recognition::{
    ClassifierState, CommandClassifier, CommandId, EngineConfig, Observer, ProcessedChunk,
    RankedCommand, RecognitionEngine, RecognitionError,
};
use crate::sim::{Scenario, ScriptedClassifier, ScriptedFrontEnd};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CHUNK: usize = 256;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<CommandEvent>>,
}

impl CommandPublisher for RecordingPublisher {
    fn publish(&self, event: &CommandEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn scripted_engine(
    scenario: &Scenario,
    observer: Arc<dyn Observer>,
    events: &EventLoop,
) -> (RecognitionEngine, Arc<ScriptedFrontEnd>) {
    let config = EngineConfig::default();
    let front_end = Arc::new(
        ScriptedFrontEnd::new(scenario, config.audio_format(), CHUNK, 8)
            .with_fetch_wait(Duration::from_millis(10)),
    );
    let classifier = ScriptedClassifier::new(
        scenario,
        CHUNK,
        config.sample_rate,
        config.command_timeout_ms,
    );
    let engine = RecognitionEngine::new(
        config,
        front_end.clone(),
        Box::new(classifier),
        events.poster(),
        observer,
    );
    (engine, front_end)
}

struct SilentObserver;

impl Observer for SilentObserver {
    fn on_waiting_for_command(&self) {}
    fn on_command_not_detected(&self) {}
    fn on_command_handling_started(&self, _message: &str) {}
    fn on_command_handling_finished(&self) {}
}

#[test]
fn event_ids_follow_command_names() {
    assert_eq!(event_id_for("Turn On the Light"), "turn_on_the_light_event");
    assert_eq!(event_id_for(" Play "), "play_event");
}

#[test]
fn default_set_lists_lights_and_media() {
    let set = CommandSet::default_set();
    assert!(set.validate().is_ok());
    assert_eq!(set.commands.len(), 18);
    assert_eq!(set.commands[1].phrases, ["Turn On the Light", "Switch On the Light"]);
    assert_eq!(set.commands[17].event_id(), "unmute_event");
}

#[test]
fn command_set_yaml_supports_overrides() {
    let set = CommandSet::from_yaml_str(
        r#"
commands:
  - phrases: ["Open the Blinds", "Blinds Up"]
    message: "Blinds"
    event: blinds_open
  - phrases: ["Close the Blinds"]
"#,
    )
    .unwrap();
    assert_eq!(set.commands[0].message.as_deref(), Some("Blinds"));
    assert_eq!(set.commands[0].event_id(), "blinds_open");
    assert_eq!(set.commands[1].event_id(), "close_the_blinds_event");
}

#[test]
fn command_set_validation() {
    assert!(CommandSet::from_yaml_str("commands: []\n").is_err());
    assert!(CommandSet::from_yaml_str("commands:\n  - phrases: []\n").is_err());
    assert!(CommandSet::from_yaml_str("commands:\n  - phrases: [\" \"]\n").is_err());
    let clash = "commands:\n  - phrases: [Play]\n  - phrases: [Start]\n    event: play_event\n";
    assert!(CommandSet::from_yaml_str(clash).is_err());
    assert!(CommandSet::from_yaml_str("commands:\n  - phrases: [Play]\n    colour: red\n").is_err());
}

#[test]
fn registered_handlers_publish_their_event() {
    let events = EventLoop::new(10);
    let (mut engine, _) = scripted_engine(&Scenario::default(), Arc::new(SilentObserver), &events);
    let publisher = Arc::new(RecordingPublisher::default());
    register_commands(&mut engine, &CommandSet::default_set(), publisher.clone()).unwrap();

    let registry = engine.commands();
    assert!(registry.is_finalized());
    assert_eq!(registry.len(), 18);
    assert_eq!(registry.get(11).unwrap().message(), "Play Music");

    registry.get(1).unwrap().handle();
    registry.get(16).unwrap().handle();
    assert_eq!(
        *publisher.events.lock().unwrap(),
        vec![
            CommandEvent::voice_command("turn_on_the_light_event", 1),
            CommandEvent::voice_command("mute_event", 16),
        ]
    );
}

#[test]
fn publisher_writes_one_json_line_per_event() {
    let buffer = SharedBuffer::default();
    let publisher = JsonLinePublisher::new(JsonLines::new(buffer.clone()));
    publisher.publish(&CommandEvent::voice_command("stop_event", 15));
    assert_eq!(
        buffer.lines(),
        vec![json!({"event_type": "voice_command", "event": "stop_event", "command_id": 15})]
    );
}

#[test]
fn console_observer_reports_board_feedback() {
    let buffer = SharedBuffer::default();
    let observer = ConsoleObserver::new(JsonLines::new(buffer.clone()), None, Duration::ZERO);
    observer.on_waiting_for_command();
    observer.on_command_handling_started("Turn Red");
    observer.on_command_handling_finished();
    observer.on_command_not_detected();
    assert_eq!(
        buffer.lines(),
        vec![
            json!({"observer": "waiting_for_command", "display": "Say command", "led": "blue", "cue": "wake"}),
            json!({"observer": "command_started", "message": "Turn Red", "display": "Turn Red", "led": "green"}),
            json!({"observer": "command_finished", "led": "off", "cue": "recognized"}),
            json!({"observer": "command_not_detected", "display": "Timeout", "led": "red", "cue": "not_recognized"}),
        ]
    );
}

#[test]
fn console_observer_reports_cue_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let format = AudioFormat::new(1, 16, 16_000);
    for (name, samples) in [
        ("wake.wav", 1_600),
        ("recognized.wav", 3_200),
        ("not_recognized.wav", 4_800),
    ] {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.path().join(name), spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(1_000i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    let cues = SoundCues::load(dir.path(), 0.05).unwrap();
    let buffer = SharedBuffer::default();
    let observer = ConsoleObserver::new(JsonLines::new(buffer.clone()), Some(cues), Duration::ZERO);
    observer.on_waiting_for_command();
    observer.on_command_not_detected();
    let lines = buffer.lines();
    assert_eq!(lines[0]["cue_ms"], 100);
    assert_eq!(lines[1]["cue_ms"], 300);
}

#[test]
fn satellite_replays_scenario_and_drains_on_shutdown() {
    let scenario = Scenario::from_yaml_str(
        r#"
steps:
  - repeat: 3
  - wake: detected
  - wake: channel_verified
  - repeat: 2
  - classify: detected
    candidates:
      - phrase: Switch Off the Light
        probability: 0.8
  - repeat: 2
"#,
    )
    .unwrap();
    let buffer = SharedBuffer::default();
    let out = JsonLines::new(buffer.clone());
    let events = EventLoop::with_wait(10, Duration::from_millis(20));
    let observer = Arc::new(ConsoleObserver::new(out.clone(), None, Duration::ZERO));
    let (mut engine, front_end) = scripted_engine(&scenario, observer, &events);
    register_commands(
        &mut engine,
        &CommandSet::default_set(),
        Arc::new(JsonLinePublisher::new(out)),
    )
    .unwrap();

    let capture = Box::new(SilenceCapture::new(
        EngineConfig::default().capture_format(),
        false,
    ));
    let mut satellite = Satellite::start(engine, events, capture).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while !front_end.is_exhausted() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(front_end.is_exhausted());
    satellite.shutdown();

    let lines = buffer.lines();
    let kinds: Vec<String> = lines
        .iter()
        .map(|line| {
            line.get("observer")
                .or_else(|| line.get("event"))
                .and_then(Value::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "waiting_for_command",
            "command_started",
            "turn_off_the_light_event",
            "command_finished"
        ]
    );
    assert_eq!(lines[1]["message"], "Turn Off the Light");
    assert_eq!(lines[2]["command_id"], 2);
    assert_eq!(satellite.stats().executed, 3);
    assert!(front_end.wakenet_enabled());
}

#[test]
fn satellite_refuses_unfinished_registration() {
    let events = EventLoop::new(10);
    let (mut engine, _) = scripted_engine(&Scenario::default(), Arc::new(SilentObserver), &events);
    engine.begin_add_commands().unwrap();
    let capture = Box::new(SilenceCapture::new(
        EngineConfig::default().capture_format(),
        false,
    ));
    assert!(Satellite::start(engine, events, capture).is_err());
}

/// Reports a command id that was never registered for every chunk it sees.
struct UnknownCommandClassifier;

impl CommandClassifier for UnknownCommandClassifier {
    fn chunk_size(&self) -> usize {
        CHUNK
    }

    fn reset_phrases(&mut self) -> Result<(), RecognitionError> {
        Ok(())
    }

    fn add_phrase(&mut self, _id: CommandId, _phrase: &str) -> Result<(), RecognitionError> {
        Ok(())
    }

    fn update_phrases(&mut self) -> Result<(), RecognitionError> {
        Ok(())
    }

    fn detect(&mut self, _chunk: &ProcessedChunk) -> ClassifierState {
        ClassifierState::Detected {
            best: RankedCommand {
                command_id: 99,
                phrase_id: 0,
                probability: 1.0,
            },
            alternatives: Vec::new(),
        }
    }
}

const PANIC_CHILD_ENV: &str = "NOSSAT_DETECT_PANIC_CHILD";
const PANIC_TEST_NAME: &str = "satellite::tests::detect_task_panic_ends_the_process";

fn run_satellite_with_unknown_command() {
    let scenario = Scenario::from_yaml_str(
        "steps:\n  - wake: detected\n  - wake: channel_verified\n  - repeat: 20\n",
    )
    .unwrap();
    let config = EngineConfig::default();
    let events = EventLoop::with_wait(10, Duration::from_millis(20));
    let front_end = Arc::new(
        ScriptedFrontEnd::new(&scenario, config.audio_format(), CHUNK, 8)
            .with_fetch_wait(Duration::from_millis(10)),
    );
    let mut engine = RecognitionEngine::new(
        config,
        front_end,
        Box::new(UnknownCommandClassifier),
        events.poster(),
        Arc::new(SilentObserver),
    );
    register_commands(
        &mut engine,
        &CommandSet::default_set(),
        Arc::new(RecordingPublisher::default()),
    )
    .unwrap();
    let capture = Box::new(SilenceCapture::new(config.capture_format(), false));
    let _satellite = Satellite::start(engine, events, capture).unwrap();
    // Only reached if the panic did not take the process down.
    std::thread::sleep(Duration::from_secs(10));
}

#[test]
fn detect_task_panic_ends_the_process() {
    if std::env::var_os(PANIC_CHILD_ENV).is_some() {
        run_satellite_with_unknown_command();
        return;
    }

    let mut child = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", PANIC_TEST_NAME, "--nocapture", "--test-threads=1"])
        .env(PANIC_CHILD_ENV, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let deadline = Instant::now() + Duration::from_secs(30);
    while child.try_wait().unwrap().is_none() {
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("satellite kept running after the detect task panicked");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let output = child.wait_with_output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("classifier reported command 99"),
        "unexpected child output: {stderr}"
    );
}
