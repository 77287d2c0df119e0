//! Client side session handling for RuX
//!
//! The bearer token issued at login is the only thing persisted about a session. Everything else
//! (user id, username, email) is derived from the token claims. [`SessionCache`] derives them
//! lazily and keeps them for a short window, so hot paths asking "who is logged in" don't decode
//! the token over and over, while a rotated, removed or expired token is still noticed within one
//! window.

mod cache;
mod claims;
mod clock;
mod store;

pub use cache::{DEFAULT_CACHE_WINDOW, SessionCache};
pub use claims::{Error as DecodeError, SessionClaims, fingerprint};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{
    Error as StoreError, FileStore, MemoryStore, PENDING_EMAIL_KEY, TOKEN_KEY, TokenStore,
};
