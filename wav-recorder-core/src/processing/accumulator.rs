use crate::models::audio_models::AudioFrame;

/// Append-only store of every frame captured since the last clear.
///
/// Owned by the consumer thread alone, so it needs no locking.
/// `total_sample_count` always equals the sum of the held frame lengths.
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    frames: Vec<AudioFrame>,
    total_sample_count: usize,
}

impl SampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame in arrival order.
    pub fn record(&mut self, frame: AudioFrame) {
        self.total_sample_count += frame.len();
        self.frames.push(frame);
    }

    /// Drop every frame and reset the sample count.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.total_sample_count = 0;
    }

    /// Read-only view for encoding. Does not clear.
    pub fn snapshot(&self) -> (&[AudioFrame], usize) {
        (&self.frames, self.total_sample_count)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn total_sample_count(&self) -> usize {
        self.total_sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
