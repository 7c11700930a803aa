//! Bounded temperature history of a channel.

use crate::error::ConfigError;
use std::collections::VecDeque;
use std::time::SystemTime;

/// Samples kept per channel for a real station.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;
/// Samples kept per channel for the simulated station.
pub const DEMO_HISTORY_CAPACITY: usize = 100;

/// One measured temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TemperatureSample {
    pub timestamp: SystemTime,
    /// Temperature in °C.
    pub value: f32,
    /// The raw fixed-point value (°C × 10), if known.
    pub internal: Option<u16>,
}

impl TemperatureSample {
    /// A sample taken now.
    pub fn now(value: f32) -> Self {
        Self {
            timestamp: SystemTime::now(),
            value,
            internal: None,
        }
    }
}

/// Summary of the samples currently held by a [`HistoryBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Statistics {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
    pub latest: f32,
    pub count: usize,
}

/// A fixed-capacity FIFO of samples; the oldest sample is evicted on overflow.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<TemperatureSample>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn append(&mut self, sample: TemperatureSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TemperatureSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TemperatureSample> {
        self.samples.iter().copied().collect()
    }

    /// Min, max, average and latest value, or `None` without samples.
    pub fn statistics(&self) -> Option<Statistics> {
        let latest = self.samples.back()?.value;
        let (min, max, sum) = self.samples.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0f64),
            |(min, max, sum), sample| {
                (
                    min.min(sample.value),
                    max.max(sample.value),
                    sum + f64::from(sample.value),
                )
            },
        );
        let count = self.samples.len();
        Some(Statistics {
            min,
            max,
            avg: (sum / count as f64) as f32,
            latest,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn buffer_with(capacity: usize, values: &[f32]) -> HistoryBuffer {
        let mut buffer = HistoryBuffer::new(capacity).unwrap();
        for value in values {
            buffer.append(TemperatureSample::now(*value));
        }
        buffer
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_matches!(HistoryBuffer::new(0), Err(ConfigError::ZeroHistoryCapacity));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let buffer = buffer_with(3, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buffer.len(), 3);
        let values: Vec<f32> = buffer.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn keeps_last_samples_in_order() {
        let values: Vec<f32> = (0..1500).map(|v| v as f32).collect();
        let buffer = buffer_with(DEFAULT_HISTORY_CAPACITY, &values);
        assert_eq!(buffer.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(buffer.iter().next().map(|s| s.value), Some(500.0));
        assert_eq!(buffer.to_vec().last().map(|s| s.value), Some(1499.0));
    }

    #[test]
    fn statistics_of_empty_buffer() {
        assert_eq!(buffer_with(10, &[]).statistics(), None);
    }

    #[test]
    fn statistics_match_contents() {
        let buffer = buffer_with(10, &[200.0, 250.0, 300.0, 250.0]);
        assert_eq!(
            buffer.statistics(),
            Some(Statistics {
                min: 200.0,
                max: 300.0,
                avg: 250.0,
                latest: 250.0,
                count: 4,
            })
        );
    }

    #[test]
    fn statistics_ignore_evicted_samples() {
        let buffer = buffer_with(2, &[900.0, 20.0, 30.0]);
        let stats = buffer.statistics().unwrap();
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.avg, 25.0);
    }
}
