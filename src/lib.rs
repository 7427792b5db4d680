// DVR Manager - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod tools;
pub mod recording;
pub mod db;
pub mod ranking;
pub mod metadata;
pub mod ingest;
pub mod attributes;
pub mod working_set;
pub mod drop_pipeline;
pub mod player;
pub mod engine;

pub use config::Config;
pub use engine::Engine;
pub use error::{DvrError, Result};
pub use recording::Recording;
