//! Integration tests for the OpenChat workspace.
//!
//! These exercise the crates together: the realtime engine driven through
//! its public join/dispatch/teardown surface, and the HTTP router built
//! the way the binary builds it. Everything runs in-process; no database
//! or network is required.

mod helpers;

mod engine_test;
mod router_test;
