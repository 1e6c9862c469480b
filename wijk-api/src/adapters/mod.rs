//! Hexagonal adapters: HTTP on the inbound side, storage and directories outbound.

pub mod inbound;
pub mod outbound;
