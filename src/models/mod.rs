//! Domain models for Quarry Lock.
//!
//! # Core Concepts
//!
//! ## Durable Entities
//!
//! - [`Rig`]: An extraction rig (quarry or pump jack). Its identity and owner
//!   survive restarts.
//! - [`Gate`]: A code lock attached to one sub-component. Survives restarts by
//!   being re-parented onto the recreated sub-component.
//!
//! ## Ephemeral Entities
//!
//! - [`SubComponent`]: Fuel bay, output hopper or engine switch of a rig. The
//!   host recreates these with new identities on every restart unless they were
//!   marked persistent, in which case the old instance is loaded as a stub.

mod actor;
mod gate;
mod rig;

pub use actor::*;
pub use gate::*;
pub use rig::*;
