//! Core type definitions used across the OpenChat workspace.

pub mod id;

pub use id::*;
