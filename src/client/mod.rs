//! Front-end session layer: keeps the signed-in user and bearer token in
//! memory and in device storage, and signs outgoing requests.

mod error;
mod session;
pub mod storage;

pub use error::{ClientError, CONNECTIVITY_MESSAGE};
pub use reqwest::Method;
pub use session::{CurrentUser, SessionClient, SessionState};
pub use storage::{FileStore, MemoryStore, SessionStore, TOKEN_KEY, USER_KEY};
