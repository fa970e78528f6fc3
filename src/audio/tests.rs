use super::{AudioCapture, AudioFormat, AudioFrame, Cue, SilenceCapture, SoundCues, WavReplayCapture};
use std::io::Cursor;
use std::time::Duration;

const MONO_16: AudioFormat = AudioFormat::new(1, 16, 16_000);
const STEREO_16: AudioFormat = AudioFormat::new(2, 16, 16_000);

fn wav_bytes(channels: u16, bits: u16, samples: &[i32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 16_000,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for &sample in samples {
            match bits {
                8 => writer.write_sample(sample as i8).expect("write i8"),
                16 => writer.write_sample(sample as i16).expect("write i16"),
                _ => writer.write_sample(sample).expect("write i32"),
            }
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

#[test]
fn format_stride_counts_all_channels() {
    let format = AudioFormat::new(3, 16, 16_000);
    assert_eq!(format.bytes_per_sample(), 2);
    assert_eq!(format.stride(), 6);
    assert_eq!(format.with_channels(2), STEREO_16);
}

#[test]
fn format_equality_requires_every_field() {
    assert_ne!(MONO_16, AudioFormat::new(1, 16, 8_000));
    assert_ne!(MONO_16, AudioFormat::new(1, 32, 16_000));
    assert_ne!(MONO_16, STEREO_16);
    assert_eq!(MONO_16, AudioFormat::new(1, 16, 16_000));
}

#[test]
fn format_duration_matches_rate() {
    assert_eq!(MONO_16.duration_of(16_000), Duration::from_secs(1));
    assert_eq!(MONO_16.duration_of(512), Duration::from_millis(32));
    assert_eq!(AudioFormat::default().duration_of(512), Duration::ZERO);
}

#[test]
fn format_validation_rejects_unsupported_widths() {
    assert!(AudioFormat::new(1, 24, 16_000).validate().is_err());
    assert!(AudioFormat::new(0, 16, 16_000).validate().is_err());
    assert!(AudioFormat::new(1, 16, 0).validate().is_err());
    assert!(AudioFormat::new(3, 32, 48_000).validate().is_ok());
}

#[test]
fn format_displays_compactly() {
    assert_eq!(AudioFormat::new(3, 16, 16_000).to_string(), "3ch/16bit/16000Hz");
}

#[test]
fn new_frame_is_zeroed_and_sized_by_stride() {
    let frame = AudioFrame::new(AudioFormat::new(3, 16, 16_000), 4);
    assert_eq!(frame.as_bytes().len(), 24);
    assert_eq!(frame.num_samples(), 4);
    assert!(frame.as_bytes().iter().all(|b| *b == 0));
}

#[test]
fn from_bytes_rejects_partial_samples() {
    assert!(AudioFrame::from_bytes(STEREO_16, vec![0; 6]).is_err());
    assert!(AudioFrame::from_bytes(STEREO_16, vec![0; 8]).is_ok());
}

#[test]
fn sample_accessors_use_interleaved_offsets() {
    let frame = AudioFrame::from_i16_samples(STEREO_16, &[1, -2, 3, -4]).expect("frame");
    assert_eq!(frame.sample(0, 0), 1);
    assert_eq!(frame.sample(0, 1), -2);
    assert_eq!(frame.sample(1, 0), 3);
    assert_eq!(frame.sample(1, 1), -4);
}

#[test]
fn set_sample_saturates_to_width() {
    let mut frame = AudioFrame::new(AudioFormat::new(1, 8, 8_000), 2);
    frame.set_sample(0, 0, 1_000);
    frame.set_sample(1, 0, -1_000);
    assert_eq!(frame.sample(0, 0), 127);
    assert_eq!(frame.sample(1, 0), -128);

    let mut frame = AudioFrame::new(MONO_16, 1);
    frame.set_sample(0, 0, 40_000);
    assert_eq!(frame.sample(0, 0), i32::from(i16::MAX));

    let mut frame = AudioFrame::new(AudioFormat::new(1, 32, 16_000), 1);
    frame.set_sample(0, 0, -70_000);
    assert_eq!(frame.sample(0, 0), -70_000);
}

#[test]
#[should_panic(expected = "outside")]
fn sample_access_past_the_end_panics() {
    let frame = AudioFrame::new(STEREO_16, 2);
    frame.sample(0, 2);
}

#[test]
fn add_channels_pads_reference_silence() {
    let mut frame = AudioFrame::from_i16_samples(STEREO_16, &[10, 11, 20, 21, 30, 31]).expect("frame");
    frame.add_channels(1);
    assert_eq!(frame.format(), AudioFormat::new(3, 16, 16_000));
    assert_eq!(frame.num_samples(), 3);
    assert_eq!(frame.to_i16_samples(), vec![10, 11, 0, 20, 21, 0, 30, 31, 0]);
}

#[test]
fn add_channels_handles_other_widths() {
    let format = AudioFormat::new(1, 32, 16_000);
    let mut frame = AudioFrame::new(format, 2);
    frame.set_sample(0, 0, 100_000);
    frame.set_sample(1, 0, -5);
    frame.add_channels(2);
    assert_eq!(frame.format().channel_count, 3);
    assert_eq!(frame.sample(0, 0), 100_000);
    assert_eq!(frame.sample(1, 0), -5);
    assert_eq!(frame.sample(1, 2), 0);
}

#[test]
fn add_zero_channels_is_a_no_op() {
    let mut frame = AudioFrame::from_i16_samples(MONO_16, &[5, 6]).expect("frame");
    let before = frame.clone();
    frame.add_channels(0);
    assert_eq!(frame, before);
}

#[test]
fn join_appends_samples_of_same_format() {
    let mut first = AudioFrame::from_i16_samples(MONO_16, &[1, 2]).expect("frame");
    let second = AudioFrame::from_i16_samples(MONO_16, &[3]).expect("frame");
    first.join(&second);
    assert_eq!(first.to_i16_samples(), vec![1, 2, 3]);
}

#[test]
#[should_panic(expected = "cannot join")]
fn join_rejects_mismatched_format() {
    let mut first = AudioFrame::new(MONO_16, 1);
    first.join(&AudioFrame::new(STEREO_16, 1));
}

#[test]
fn adjust_volume_scales_and_saturates() {
    let mut frame = AudioFrame::from_i16_samples(MONO_16, &[1_000, -1_000, 30_000]).expect("frame");
    frame.adjust_volume(0.5);
    assert_eq!(frame.to_i16_samples(), vec![500, -500, 15_000]);
    frame.adjust_volume(4.0);
    assert_eq!(frame.to_i16_samples(), vec![2_000, -2_000, i16::MAX]);
}

#[test]
fn wav_decoding_keeps_file_format() {
    let bytes = wav_bytes(2, 16, &[100, -100, 200, -200]);
    let frame = AudioFrame::from_wav_bytes(&bytes).expect("decode wav");
    assert_eq!(frame.format(), STEREO_16);
    assert_eq!(frame.to_i16_samples(), vec![100, -100, 200, -200]);
}

#[test]
fn wav_decoding_supports_eight_bit_files() {
    let bytes = wav_bytes(1, 8, &[-5, 7]);
    let frame = AudioFrame::from_wav_bytes(&bytes).expect("decode wav");
    assert_eq!(frame.format(), AudioFormat::new(1, 8, 16_000));
    assert_eq!(frame.sample(0, 0), -5);
    assert_eq!(frame.sample(1, 0), 7);
}

#[test]
fn wav_decoding_rejects_garbage() {
    assert!(AudioFrame::from_wav_bytes(b"definitely not a wav").is_err());
}

#[test]
fn load_wav_reports_missing_file() {
    let err = AudioFrame::load_wav(std::path::Path::new("/no/such/cue.wav")).unwrap_err();
    assert!(format!("{err:#}").contains("/no/such/cue.wav"));
}

#[test]
fn silence_capture_zeroes_frame() {
    let mut capture = SilenceCapture::new(STEREO_16, false);
    let mut frame = AudioFrame::from_i16_samples(STEREO_16, &[9, 9, 9, 9]).expect("frame");
    capture.capture(&mut frame).expect("capture");
    assert_eq!(frame.to_i16_samples(), vec![0, 0, 0, 0]);
    assert_eq!(capture.name(), "silence");
}

#[test]
fn capture_rejects_foreign_frame_format() {
    let mut capture = SilenceCapture::new(STEREO_16, false);
    let mut frame = AudioFrame::new(MONO_16, 4);
    assert!(capture.capture(&mut frame).is_err());
}

#[test]
fn realtime_silence_capture_is_paced() {
    let mut capture = SilenceCapture::new(MONO_16, true);
    let mut frame = AudioFrame::new(MONO_16, 160);
    let start = std::time::Instant::now();
    for _ in 0..3 {
        capture.capture(&mut frame).expect("capture");
    }
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn wav_replay_wraps_around() {
    let source = AudioFrame::from_i16_samples(MONO_16, &[1, 2, 3]).expect("frame");
    let mut capture = WavReplayCapture::from_frame(source, false).expect("replay");
    let mut frame = AudioFrame::new(MONO_16, 2);
    capture.capture(&mut frame).expect("capture");
    assert_eq!(frame.to_i16_samples(), vec![1, 2]);
    capture.capture(&mut frame).expect("capture");
    assert_eq!(frame.to_i16_samples(), vec![3, 1]);
    capture.capture(&mut frame).expect("capture");
    assert_eq!(frame.to_i16_samples(), vec![2, 3]);
}

#[test]
fn wav_replay_rejects_empty_recording() {
    assert!(WavReplayCapture::from_frame(AudioFrame::new(MONO_16, 0), false).is_err());
}

#[test]
fn sound_cues_load_and_attenuate() {
    let dir = tempfile::tempdir().expect("tempdir");
    for cue in [Cue::Wake, Cue::Recognized, Cue::NotRecognized] {
        std::fs::write(dir.path().join(cue.file_name()), wav_bytes(1, 16, &[10_000, -10_000]))
            .expect("write cue");
    }
    let cues = SoundCues::load(dir.path(), 0.1).expect("load cues");
    assert_eq!(cues.get(Cue::Wake).to_i16_samples(), vec![1_000, -1_000]);
    assert_eq!(cues.get(Cue::NotRecognized).num_samples(), 2);
}

#[test]
fn sound_cues_require_every_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(Cue::Wake.file_name()), wav_bytes(1, 16, &[1])).expect("write");
    let err = SoundCues::load(dir.path(), 0.1).unwrap_err();
    assert!(format!("{err:#}").contains("recognized.wav"));
}

#[test]
#[should_panic(expected = "unsupported sample width 24 bits")]
fn new_frame_rejects_unsupported_width() {
    AudioFrame::new(AudioFormat::new(1, 24, 16_000), 4);
}
