//! Request extractors.

mod session;
pub use session::{bearer_token, CurrentUser, PriorSession};
