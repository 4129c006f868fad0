use std::time::{Duration, Instant};

use crate::config::CommandConfig;

/// Watches typed characters for the summon sequence (`//m` by default).
///
/// Keeps a short rolling buffer that is dropped once input pauses for longer
/// than the configured timeout.
#[derive(Clone, Debug)]
pub(crate) struct CommandListener {
    sequence: String,
    timeout: Duration,
    capacity: usize,
    buffer: String,
    last_input: Option<Instant>,
}

impl CommandListener {
    pub(crate) fn new(config: &CommandConfig) -> Self {
        Self {
            sequence: config.sequence.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            capacity: config.buffer_len.max(config.sequence.chars().count()),
            buffer: String::new(),
            last_input: None,
        }
    }

    pub(crate) fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Returns true when `ch` completes the sequence.
    pub(crate) fn feed(&mut self, ch: char, now: Instant) -> bool {
        if self
            .last_input
            .is_some_and(|last| now.saturating_duration_since(last) > self.timeout)
        {
            self.buffer.clear();
        }
        self.last_input = Some(now);
        self.buffer.push(ch);

        if !self.sequence.is_empty() && self.buffer.contains(&self.sequence) {
            self.buffer.clear();
            return true;
        }

        let len = self.buffer.chars().count();
        if len > self.capacity {
            let skip = self
                .buffer
                .char_indices()
                .nth(len - self.capacity)
                .map(|(index, _)| index)
                .unwrap_or(0);
            self.buffer.drain(..skip);
        }
        false
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.last_input = None;
    }
}
