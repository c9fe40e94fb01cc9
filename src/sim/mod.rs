pub mod config;
pub mod report;
pub mod top;

pub use config::{Config, GemmConfig, GpuConfig, PolicyKind, RemapConfig, SimConfig};
pub use report::SimReport;
pub use top::{Sim, WaveShape};
