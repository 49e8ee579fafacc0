//! Admin session: persisted credentials, token expiry checks, and the
//! observable authentication state.

mod auth;
pub mod state;
pub mod store;
pub mod token;

pub use auth::{AuthSession, LoginOutcome, PROFILE_UNAVAILABLE_MESSAGE};
pub use state::{AuthPhase, AuthSnapshot, SessionEvent, SessionState};
pub use store::{FileStorage, MemoryStorage, SessionStore, Storage};
