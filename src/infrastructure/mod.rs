// Infrastructure layer - Configuration, storage, clocks and file adapters
pub mod clock;
pub mod config;
pub mod memory_sequence;
pub mod replay_source;
