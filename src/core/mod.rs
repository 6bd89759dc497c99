//! Core provider integrations.

pub mod realtime;
