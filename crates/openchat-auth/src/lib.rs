//! # openchat-auth
//!
//! Cookie session authentication for OpenChat, split-token style:
//!
//! - `token` — selector/validator/salt generation and constant-time
//!   validator verification
//! - `session` — session lifecycle (issue, resolve, revoke, purge) and
//!   the realtime engine's session resolver
//!
//! The cookie value is `<selector>.<validator>`; only the salted SHA-512
//! of the validator is ever stored, so a leaked token table cannot be
//! replayed.

pub mod session;
pub mod token;

pub use session::SessionService;
pub use token::TokenMaterial;
