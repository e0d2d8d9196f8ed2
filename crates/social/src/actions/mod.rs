//! Social actions module
//!
//! Provides high-level handlers for follow-graph changes and profile
//! editing on behalf of the signed-in user.

mod follow;
mod profile;

pub use follow::FollowHandler;
pub use profile::ProfileHandler;
