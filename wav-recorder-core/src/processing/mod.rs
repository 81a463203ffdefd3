pub mod accumulator;
pub mod frame_chunker;
pub mod wav_format;
