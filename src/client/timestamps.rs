// Media timestamp normalization

use std::collections::HashMap;

use crate::rtmp::RtmpMessage;

/// Absolute timestamps, by chunk stream
///
/// The first message of a chunk stream sets its timestamp as is.
/// After that, deltas are added and absolute timestamps never move it back.
#[derive(Default, Debug)]
pub struct TimestampAccumulator {
    last: HashMap<u32, u32>,
}

impl TimestampAccumulator {
    /// Creates TimestampAccumulator
    pub fn new() -> TimestampAccumulator {
        TimestampAccumulator::default()
    }

    /// Computes the absolute timestamp of a message
    pub fn absolute_timestamp(&mut self, msg: &RtmpMessage) -> u32 {
        self.update(msg.chunk_stream_id, msg.timestamp, msg.timestamp_is_absolute)
    }

    /// Updates a chunk stream with a timestamp value
    /// Returns the new absolute timestamp
    pub fn update(&mut self, chunk_stream_id: u32, value: u32, is_absolute: bool) -> u32 {
        let ts = match self.last.get(&chunk_stream_id) {
            None => value,
            Some(current) if is_absolute => (*current).max(value),
            Some(current) => current.wrapping_add(value),
        };

        self.last.insert(chunk_stream_id, ts);

        ts
    }

    /// Gets the last absolute timestamp of a chunk stream
    pub fn get(&self, chunk_stream_id: u32) -> Option<u32> {
        self.last.get(&chunk_stream_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_accumulate_from_first_value() {
        let mut acc = TimestampAccumulator::new();

        let out: Vec<u32> = [0, 40, 40, 40]
            .iter()
            .map(|delta| acc.update(6, *delta, false))
            .collect();

        assert_eq!(out, vec![0, 40, 80, 120]);

        let mut acc = TimestampAccumulator::new();

        let out: Vec<u32> = [1000, 40, 40, 40]
            .iter()
            .enumerate()
            .map(|(i, v)| acc.update(6, *v, i == 0))
            .collect();

        assert_eq!(out, vec![1000, 1040, 1080, 1120]);
    }

    #[test]
    fn test_chunk_streams_are_independent() {
        let mut acc = TimestampAccumulator::new();

        acc.update(4, 500, true);
        acc.update(6, 20, true);
        acc.update(4, 23, false);

        assert_eq!(acc.get(4), Some(523));
        assert_eq!(acc.get(6), Some(20));
        assert_eq!(acc.get(7), None);
    }

    #[test]
    fn test_absolute_values_never_go_back() {
        let mut acc = TimestampAccumulator::new();

        acc.update(6, 2000, true);

        assert_eq!(acc.update(6, 1500, true), 2000);
        assert_eq!(acc.update(6, 2500, true), 2500);
    }
}
