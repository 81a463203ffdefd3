use serde::{Deserialize, Serialize};

/// Transport type for an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// One fixed-length batch of samples delivered by the capture device.
///
/// Samples are interleaved `f32` nominally in `[-1.0, 1.0]`. `len()` counts
/// sample frames (samples per channel), not raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    channels: u16,
}

impl AudioFrame {
    /// Wrap interleaved samples. A zero channel count is treated as mono.
    pub fn new(samples: Vec<f32>, channels: u16) -> Self {
        Self {
            samples,
            channels: channels.max(1),
        }
    }

    pub fn mono(samples: Vec<f32>) -> Self {
        Self::new(samples, 1)
    }

    /// Number of sample frames in this batch.
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at `index` on `channel`, falling back to the last channel
    /// this frame carries when `channel` is out of range.
    pub fn sample(&self, index: usize, channel: u16) -> f32 {
        let ch = channel.min(self.channels - 1) as usize;
        self.samples[index * self.channels as usize + ch]
    }
}

/// Counters kept by the capture session for debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub callback_count: u64,
    pub samples_received: u64,
    pub frames_posted: u64,
    pub frames_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_len_counts_sample_frames() {
        let frame = AudioFrame::new(vec![0.1, 0.2, 0.3, 0.4], 2);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.channels(), 2);
        assert_eq!(frame.sample(1, 0), 0.3);
        assert_eq!(frame.sample(1, 1), 0.4);
    }

    #[test]
    fn out_of_range_channel_reads_last_channel() {
        let frame = AudioFrame::mono(vec![0.5, -0.5]);
        assert_eq!(frame.sample(0, 1), 0.5);
        assert_eq!(frame.sample(1, 3), -0.5);
    }

    #[test]
    fn zero_channels_treated_as_mono() {
        let frame = AudioFrame::new(vec![0.0; 3], 0);
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.len(), 3);
    }
}
