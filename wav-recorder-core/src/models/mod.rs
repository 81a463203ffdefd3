pub mod audio_models;
pub mod blob;
pub mod config;
pub mod error;
pub mod state;
