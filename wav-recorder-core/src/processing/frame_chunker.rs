use crate::models::audio_models::AudioFrame;

/// Re-blocks device callback buffers into frames of a fixed length.
///
/// Devices deliver whatever buffer size the host picked; the rest of the
/// pipeline wants frames of exactly `frame_len` sample frames. Leftover
/// samples wait for the next write. A partial frame is never emitted.
#[derive(Debug)]
pub struct FrameChunker {
    pending: Vec<f32>,
    frame_len: usize,
    channels: u16,
}

impl FrameChunker {
    pub fn new(frame_len: usize, channels: u16) -> Self {
        let channels = channels.max(1);
        Self {
            pending: Vec::with_capacity(frame_len * channels as usize),
            frame_len,
            channels,
        }
    }

    /// Write interleaved samples and return every frame they complete.
    ///
    /// A change in channel count discards the partial frame collected so
    /// far, since it cannot be combined with the new layout.
    pub fn write(&mut self, samples: &[f32], channels: u16) -> Vec<AudioFrame> {
        let channels = channels.max(1);
        if channels != self.channels {
            if !self.pending.is_empty() {
                log::warn!(
                    "channel count changed {} -> {}; dropping {} buffered samples",
                    self.channels,
                    channels,
                    self.pending.len()
                );
            }
            self.pending.clear();
            self.channels = channels;
        }
        if self.frame_len == 0 || samples.is_empty() {
            return Vec::new();
        }

        let width = self.frame_len * self.channels as usize;
        let mut frames = Vec::new();
        let mut input = samples;
        while !input.is_empty() {
            let take = (width - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..take]);
            input = &input[take..];

            if self.pending.len() == width {
                let full = std::mem::replace(&mut self.pending, Vec::with_capacity(width));
                frames.push(AudioFrame::new(full, self.channels));
            }
        }
        frames
    }

    /// Sample frames waiting for the next complete frame.
    pub fn pending(&self) -> usize {
        self.pending.len() / self.channels as usize
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Discard any partial frame.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_buffer_yields_one_frame() {
        let mut chunker = FrameChunker::new(4, 1);
        let frames = chunker.write(&[1.0, 2.0, 3.0, 4.0], 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(chunker.pending(), 0);
    }

    #[test]
    fn small_buffers_accumulate() {
        let mut chunker = FrameChunker::new(4, 1);
        assert!(chunker.write(&[1.0, 2.0, 3.0], 1).is_empty());
        assert_eq!(chunker.pending(), 3);

        let frames = chunker.write(&[4.0, 5.0], 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(chunker.pending(), 1);
    }

    #[test]
    fn large_buffer_splits_into_several_frames() {
        let mut chunker = FrameChunker::new(2, 1);
        let frames = chunker.write(&[1.0, 2.0, 3.0, 4.0, 5.0], 1);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].samples(), &[1.0, 2.0]);
        assert_eq!(frames[1].samples(), &[3.0, 4.0]);
        assert_eq!(chunker.pending(), 1);
    }

    #[test]
    fn stereo_frames_hold_frame_len_sample_frames() {
        let mut chunker = FrameChunker::new(2, 2);
        let frames = chunker.write(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 2);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0].channels(), 2);
        assert_eq!(chunker.pending(), 1);
    }

    #[test]
    fn channel_change_drops_partial_frame() {
        let mut chunker = FrameChunker::new(4, 1);
        chunker.write(&[1.0, 2.0], 1);
        let frames = chunker.write(&[0.0; 8], 2);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channels(), 2);
        assert_eq!(frames[0].samples(), &[0.0; 8]);
    }

    #[test]
    fn reset_discards_partial() {
        let mut chunker = FrameChunker::new(4, 1);
        chunker.write(&[1.0, 2.0], 1);
        chunker.reset();
        assert_eq!(chunker.pending(), 0);
        let frames = chunker.write(&[3.0, 4.0, 5.0, 6.0], 1);
        assert_eq!(frames[0].samples(), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_operations() {
        let mut chunker = FrameChunker::new(4, 1);
        assert!(chunker.write(&[], 1).is_empty());
        assert_eq!(chunker.pending(), 0);
    }
}
