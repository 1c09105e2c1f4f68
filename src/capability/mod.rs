//! Capabilities the planning model can call.
//!
//! Each capability wraps a catalogue client operation behind a fixed argument
//! schema. Descriptors are built once and shared; requests from the planner are
//! decoded into typed [`Capability`] values before anything touches the network.

mod descriptor;
mod executor;
mod tools;

pub use descriptor::{CapabilityDescriptor, CapabilitySet};
pub use executor::CapabilityExecutor;
pub use tools::{
    parse_capability, Capability, CapabilityOutcome, CapabilityRequest, CapabilityResult,
};
