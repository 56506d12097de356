// Application layer - Calculation services and the abstractions they depend on
pub mod bounded_sequence;
pub mod clock;
pub mod compressor_timing_service;
pub mod cop_service;
pub mod defrost_guard;
pub mod metrics_service;
pub mod rehydration;
pub mod thermal_energy_service;
