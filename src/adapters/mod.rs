//! Port implementations.
//!
//! `live` talks to the local system, `recording` wraps live adapters and
//! captures their answers into a cassette, `replaying` serves answers back
//! from one.

pub mod live;
pub mod recording;
pub mod replaying;
