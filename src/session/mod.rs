//! Session emulation
//!
//! Turns either a username and password or a raw `MoodleSession` cookie
//! value into a [`SessionCredential`]. The credential is the only state a
//! caller needs to keep; there is no stored password and no silent re-login.

mod credential;
mod login;
mod resume;

pub use credential::SessionCredential;
pub use login::{login_with_credentials, LoginFlow, LoginStep};
pub use resume::resume_session;
