/// Default maximum buffered event size: 16 MiB.
pub const DEFAULT_MAX_EVENT_SIZE: usize = 16 * 1024 * 1024;

/// Default initial read buffer capacity: 8 KiB.
pub const DEFAULT_INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for the IR stream adapters.
#[derive(Debug, Clone)]
pub struct IrConfig {
    /// Largest amount of unconsumed input buffered while waiting for one
    /// event (or the preamble) to complete. Default: 16 MiB.
    pub max_event_size: usize,
    /// Initial capacity of the read and write buffers. Default: 8 KiB.
    pub initial_buffer_capacity: usize,
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
            initial_buffer_capacity: DEFAULT_INITIAL_BUFFER_CAPACITY,
        }
    }
}

/// Stream-wide settings written into the preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreambleConfig {
    /// Timestamp pattern of the original log text.
    pub timestamp_pattern: String,
    /// Syntax the timestamp pattern is written in.
    pub timestamp_pattern_syntax: String,
    /// Time zone id, e.g. `America/Toronto`.
    pub time_zone_id: String,
    /// Timestamp the first four-byte delta is relative to. Ignored by
    /// eight-byte streams.
    pub reference_timestamp: i64,
}

impl Default for PreambleConfig {
    fn default() -> Self {
        Self {
            timestamp_pattern: String::new(),
            timestamp_pattern_syntax: String::new(),
            time_zone_id: "UTC".to_string(),
            reference_timestamp: 0,
        }
    }
}
