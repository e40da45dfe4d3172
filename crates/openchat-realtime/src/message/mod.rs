//! Wire frames exchanged over room sockets.

pub mod frame;

pub use frame::{ChatFrame, FrameError, FrameKind};
