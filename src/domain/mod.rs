// Domain layer - Core calculation models
pub mod compressor;
pub mod defrost;
pub mod energy;
pub mod operation_mode;
pub mod power;
pub mod reading;
