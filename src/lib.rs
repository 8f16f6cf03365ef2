//! Quarry Lock: code locks on the fuel bay, output hopper and engine switch of
//! extraction rigs (quarries and pump jacks).
//!
//! The lock itself is simple. The crate exists to keep it attached to the
//! right sub-component across the host's lifecycle, including restarts where
//! the host recreates every sub-component with a new identity.

pub mod api;
pub mod config;
pub mod db;
pub mod deploy;
pub mod geometry;
pub mod groups;
pub mod host;
pub mod intercept;
pub mod lang;
pub mod models;
pub mod permissions;
pub mod placement;
pub mod plugin;
pub mod reconcile;
pub mod tasks;
pub mod world;
