//! Telemetry sources feeding one [`Reading`] per tick.
//!
//! - [`Simulator`]: randomized readings with occasional faults
//! - [`ReplaySource`]: readings recorded as JSON lines
//!
//! [`Reading`]: carwatch_core::Reading

pub mod replay;
pub mod simulator;
pub mod source;

pub use replay::ReplaySource;
pub use simulator::{Simulator, SimulatorProfile};
pub use source::TelemetrySource;
