//! WAV encoding for accumulated capture frames.
//!
//! Produces a standard 44-byte RIFF/WAVE header followed by interleaved
//! 16-bit signed little-endian PCM.

use crate::models::audio_models::AudioFrame;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Output sample width. Only PCM16 is produced.
pub const BITS_PER_SAMPLE: u16 = 16;

const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Generate a 44-byte WAV RIFF header for 16-bit PCM.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * 2
/// [32-33]  block_align = channels * 2
/// [34-35]  16
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Derived fields saturate at their field width instead of overflowing.
pub fn generate_wav_header(sample_rate: u32, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let block_align_wide = u32::from(channels) * BYTES_PER_SAMPLE as u32;
    let block_align = u16::try_from(block_align_wide).unwrap_or(u16::MAX);
    let byte_rate = u32::try_from(u64::from(sample_rate) * u64::from(block_align_wide)).unwrap_or(u32::MAX);
    let chunk_size = data_size.saturating_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Convert one float sample to PCM16: clamp to `[-1.0, 1.0]`, scale by
/// 32767 and truncate toward zero.
pub fn float_to_pcm16(sample: f32) -> i16 {
    // NaN clamps to NaN and casts to 0.
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Size in bytes of the PCM payload for `total_sample_count` sample frames.
pub fn data_size(total_sample_count: usize, channels: u16) -> usize {
    total_sample_count
        .saturating_mul(channels as usize)
        .saturating_mul(BYTES_PER_SAMPLE)
}

/// Encode accumulated frames into a complete RIFF/WAVE byte sequence.
///
/// Writes exactly `total_sample_count` sample frames of `channels`
/// channels, in frame arrival order. A frame carrying fewer channels than
/// requested repeats its last channel. If the frames hold fewer samples
/// than `total_sample_count` the remainder is written as silence, so the
/// payload always matches the header.
///
/// The RIFF size fields are 32-bit; payloads beyond 4 GiB are not representable.
pub fn encode(frames: &[AudioFrame], total_sample_count: usize, sample_rate: u32, channels: u16) -> Vec<u8> {
    let payload = data_size(total_sample_count, channels);
    let header = generate_wav_header(sample_rate, channels, u32::try_from(payload).unwrap_or(u32::MAX));

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + payload);
    out.extend_from_slice(&header);

    let mut remaining = total_sample_count;
    for frame in frames {
        if remaining == 0 {
            break;
        }
        let take = frame.len().min(remaining);
        for i in 0..take {
            for ch in 0..channels {
                out.extend_from_slice(&float_to_pcm16(frame.sample(i, ch)).to_le_bytes());
            }
        }
        remaining -= take;
    }

    if remaining > 0 {
        log::warn!("frames short by {} sample frames; padding with silence", remaining);
        out.resize(WAV_HEADER_SIZE + payload, 0);
    }

    out
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}

/// Format fields read back from an encoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the leading 44 bytes of `bytes`. Returns `None` unless they
    /// form a PCM RIFF/WAVE header with `fmt ` and `data` chunks in the
    /// canonical positions.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..WAV_HEADER_SIZE)?;
        if &header[0..4] != b"RIFF"
            || &header[8..12] != b"WAVE"
            || &header[12..16] != b"fmt "
            || &header[36..40] != b"data"
        {
            return None;
        }
        if read_u32(header, 16) != 16 || read_u16(header, 20) != 1 {
            return None;
        }
        Some(Self {
            chunk_size: read_u32(header, 4),
            channels: read_u16(header, 22),
            sample_rate: read_u32(header, 24),
            byte_rate: read_u32(header, 28),
            block_align: read_u16(header, 32),
            bits_per_sample: read_u16(header, 34),
            data_size: read_u32(header, 40),
        })
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
