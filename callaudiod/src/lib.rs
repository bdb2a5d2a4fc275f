//! Audio routing core for call-mode switching against a PulseAudio-compatible
//! server: discovers the internal card's sink and source, selects ports and
//! profiles as intents arrive, and reconciles against the server's own
//! subscription notifications.
//!
//! See [`facade`] for the public entry points a control surface would call,
//! and [`session::Session`] for the connection this crate's binary drives.

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod facade;
pub mod reactor;
pub mod selector;
pub mod session;
pub mod topology;
pub mod transport;
