//! Database layer (Supabase PostgREST, or in-memory for tests).

pub mod memory;
pub mod postgrest;

pub use memory::MemoryDb;
pub use postgrest::PostgrestDb;

use crate::models::{FriendLink, Group, Member, NewGroup};
use async_trait::async_trait;

/// Table names as constants.
pub mod tables {
    pub const GROUPS: &str = "groups";
    pub const FRIEND_LINKS: &str = "friend_links";
    pub const USERS: &str = "users";
}

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A single-row read matched zero rows or more than one.
    #[error("expected exactly one row")]
    NotSingle,

    /// The store answered with a non-success status.
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never got a usable answer.
    #[error("store request failed: {0}")]
    Transport(String),
}

/// The operations the group service needs from the data store.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Get a group by id. A missing row is `Ok(None)` or `Err(NotSingle)`
    /// depending on the backend.
    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, DbError>;

    /// All groups whose member list contains `user_id`, newest first.
    async fn find_groups_with_member(&self, user_id: &str) -> Result<Vec<Group>, DbError>;

    /// Insert a group and return the row the store echoed back, if any.
    async fn insert_group(&self, group: &NewGroup) -> Result<Option<Group>, DbError>;

    /// Look up a friend link by its row id.
    async fn find_friend_link(&self, link_id: &str) -> Result<Option<FriendLink>, DbError>;

    /// Public member fields for the given user ids. Unknown ids are skipped.
    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<Member>, DbError>;
}
