//! Session token entities.

pub mod model;

pub use model::{IssuedSession, SessionToken};
