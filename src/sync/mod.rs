//! The metadata synchronization engine: local upsert, best-effort central
//! mirroring, and the daily master aggregation.

pub mod aggregate;
pub mod local;
pub mod mirror;
pub mod record;
