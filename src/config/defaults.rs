pub const DEFAULT_MIC_CHANNELS: u32 = 2;
pub const DEFAULT_REFERENCE_CHANNELS: u32 = 1;
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_BITS_PER_SAMPLE: u32 = 16;
/// 32 ms at 16 kHz, the front end's native chunk.
pub const DEFAULT_CHUNK_SAMPLES: usize = 512;
pub const DEFAULT_FRONT_END_RING_CHUNKS: usize = crate::sim::DEFAULT_RING_CHUNKS;
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = crate::recognition::DEFAULT_COMMAND_TIMEOUT_MS;
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = crate::event_loop::DEFAULT_QUEUE_CAPACITY;
pub const DEFAULT_EVENT_WAIT_MS: u64 = 1000;
pub const DEFAULT_FEEDBACK_HOLD_MS: u64 = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const MAX_CHANNELS: u32 = 8;
pub const MAX_CHUNK_SAMPLES: usize = 16_384;
pub const MAX_RING_CHUNKS: usize = 4_096;
pub const MAX_COMMAND_TIMEOUT_MS: u64 = 60_000;
pub const MAX_EVENT_QUEUE_CAPACITY: usize = 1_024;
pub const MAX_FEEDBACK_HOLD_MS: u64 = 10_000;
