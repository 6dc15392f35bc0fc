// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group management: creation, listing, lookup and membership.
//!
//! Membership rules live here rather than in the database: the creator is
//! always a member, and members added at creation are referenced through
//! friend links.

use crate::db::GroupRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Group, Member, NewGroup};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Friend-link lookups in flight at once during group creation.
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Group service.
#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    /// Create a group owned by `creator`, adding the friends behind `member_row_ids`.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<String>,
        member_row_ids: &[String],
        creator: &AuthUser,
    ) -> Result<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(
                "Group name cannot be empty".to_string(),
            ));
        }

        // Lookups run concurrently; results come back in request order so the
        // first bad id reported is the first one the client sent.
        let friend_ids: Vec<String> = stream::iter(member_row_ids.iter().cloned())
            .map(|row_id| {
                let service = self.clone();
                async move { service.resolve_friend(&row_id).await }
            })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await?;

        let members = unique_members(&creator.id, friend_ids);

        let new_group = NewGroup {
            name: name.to_string(),
            description,
            members,
        };

        let group = self
            .repo
            .insert_group(&new_group)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Group insert returned no data")))?;

        tracing::info!(
            group_id = %group.id,
            creator = %creator.id,
            members = group.members.len(),
            "Group created"
        );

        Ok(group)
    }

    /// Map a friend link row id to the friend's user id.
    async fn resolve_friend(&self, row_id: &str) -> Result<String> {
        let not_found = || AppError::BadRequest(format!("Friend id {} not found", row_id));

        match self.repo.find_friend_link(row_id).await {
            Ok(link) => link
                .and_then(|l| l.friend_id)
                .filter(|id| !id.is_empty())
                .ok_or_else(not_found),
            Err(e) => {
                tracing::debug!(row_id = %row_id, error = %e, "Friend link lookup failed");
                Err(not_found())
            }
        }
    }

    /// Groups that `user_id` belongs to, newest first.
    pub async fn list_groups_for(&self, user_id: &str) -> Result<Vec<Group>> {
        self.repo
            .find_groups_with_member(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch one group. Store errors count as "not found".
    pub async fn get_group(&self, group_id: &str) -> Result<Group> {
        match self.repo.find_group(group_id).await {
            Ok(Some(group)) => Ok(group),
            Ok(None) => Err(AppError::NotFound("Group not found".to_string())),
            Err(e) => {
                tracing::debug!(group_id, error = %e, "Group lookup failed");
                Err(AppError::NotFound("Group not found".to_string()))
            }
        }
    }

    /// Public profile fields of a group's members.
    pub async fn list_group_members(&self, group_id: &str) -> Result<Vec<Member>> {
        let group = self.get_group(group_id).await?;

        if group.members.is_empty() {
            return Ok(Vec::new());
        }

        self.repo
            .find_users_by_ids(&group.members)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Creator first, then friends; duplicates and empty ids dropped.
fn unique_members(creator_id: &str, friend_ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(creator_id.to_string())
        .chain(friend_ids)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, MemoryDb};
    use crate::models::FriendLink;
    use async_trait::async_trait;

    fn creator(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: format!("{}@example.com", id),
        }
    }

    /// Store whose calls fail. `echo_nothing` makes inserts succeed without
    /// a row; `group` makes group lookups succeed so later calls can fail.
    #[derive(Default)]
    struct BrokenDb {
        echo_nothing: bool,
        group: Option<Group>,
    }

    #[async_trait]
    impl GroupRepository for BrokenDb {
        async fn find_group(&self, _: &str) -> std::result::Result<Option<Group>, DbError> {
            match &self.group {
                Some(group) => Ok(Some(group.clone())),
                None => Err(DbError::NotSingle),
            }
        }
        async fn find_groups_with_member(
            &self,
            _: &str,
        ) -> std::result::Result<Vec<Group>, DbError> {
            Err(DbError::Transport("connection refused".to_string()))
        }
        async fn insert_group(&self, _: &NewGroup) -> std::result::Result<Option<Group>, DbError> {
            if self.echo_nothing {
                Ok(None)
            } else {
                Err(DbError::Rejected {
                    status: 409,
                    message: "duplicate key".to_string(),
                })
            }
        }
        async fn find_friend_link(
            &self,
            _: &str,
        ) -> std::result::Result<Option<FriendLink>, DbError> {
            Err(DbError::NotSingle)
        }
        async fn find_users_by_ids(
            &self,
            _: &[String],
        ) -> std::result::Result<Vec<Member>, DbError> {
            Err(DbError::Transport("timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn test_blank_name_rejected_without_insert() {
        let db = Arc::new(MemoryDb::new());
        let service = GroupService::new(db.clone());

        for name in ["", "   ", "\t\n"] {
            let err = service
                .create_group(name, None, &[], &creator("u1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert_eq!(db.group_count(), 0);
    }

    #[tokio::test]
    async fn test_members_resolved_through_friend_links() {
        let db = Arc::new(MemoryDb::new());
        db.add_friend_link("row1", "u2");
        let service = GroupService::new(db);

        let group = service
            .create_group(" Trip ", None, &["row1".to_string()], &creator("u1"))
            .await
            .unwrap();

        assert_eq!(group.name, "Trip");
        assert_eq!(group.members, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_creator_listed_once() {
        let db = Arc::new(MemoryDb::new());
        db.add_friend_link("self", "u1");
        db.add_friend_link("row1", "u2");
        db.add_friend_link("row2", "u2");
        let service = GroupService::new(db);

        let ids: Vec<String> = ["self", "row1", "row2", "row1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let group = service
            .create_group("Trip", None, &ids, &creator("u1"))
            .await
            .unwrap();

        assert_eq!(group.members.iter().filter(|m| *m == "u1").count(), 1);
        assert_eq!(group.members, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_first_unknown_friend_link_named() {
        let db = Arc::new(MemoryDb::new());
        db.add_friend_link("row1", "u2");
        let service = GroupService::new(db.clone());

        let ids: Vec<String> = ["row1", "missing-a", "missing-b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let err = service
            .create_group("Trip", None, &ids, &creator("u1"))
            .await
            .unwrap_err();

        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Friend id missing-a not found"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.group_count(), 0);
    }

    #[tokio::test]
    async fn test_friend_lookup_error_is_bad_request() {
        let service = GroupService::new(Arc::new(BrokenDb::default()));
        let err = service
            .create_group("Trip", None, &["row1".to_string()], &creator("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_insert_failures_are_internal() {
        let service = GroupService::new(Arc::new(BrokenDb::default()));
        let err = service
            .create_group("Trip", None, &[], &creator("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let service = GroupService::new(Arc::new(BrokenDb {
            echo_nothing: true,
            ..Default::default()
        }));
        let err = service
            .create_group("Trip", None, &[], &creator("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_get_group_not_found_both_paths() {
        let service = GroupService::new(Arc::new(MemoryDb::new()));
        assert!(matches!(
            service.get_group("404").await,
            Err(AppError::NotFound(_))
        ));

        let service = GroupService::new(Arc::new(BrokenDb::default()));
        assert!(matches!(
            service.get_group("404").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.list_group_members("404").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_members_empty_group_and_unknown_users() {
        let db = Arc::new(MemoryDb::new());
        db.put_group(Group {
            id: "g1".to_string(),
            name: "Empty".to_string(),
            description: None,
            members: vec![],
            created_at: None,
        });
        db.put_group(Group {
            id: "g2".to_string(),
            name: "Ghosts".to_string(),
            description: None,
            members: vec!["nobody".to_string()],
            created_at: None,
        });
        let service = GroupService::new(db);

        assert!(service.list_group_members("g1").await.unwrap().is_empty());
        assert!(service.list_group_members("g2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_groups_store_failure() {
        let service = GroupService::new(Arc::new(BrokenDb::default()));
        assert!(matches!(
            service.list_groups_for("u1").await,
            Err(AppError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_member_lookup_failure_is_internal() {
        let service = GroupService::new(Arc::new(BrokenDb {
            group: Some(Group {
                id: "g1".to_string(),
                name: "Trip".to_string(),
                description: None,
                members: vec!["u1".to_string(), "u2".to_string()],
                created_at: None,
            }),
            ..Default::default()
        }));

        assert!(service.get_group("g1").await.is_ok());
        assert!(matches!(
            service.list_group_members("g1").await,
            Err(AppError::Database(_))
        ));
    }

    // Handlers need the creation future to be Send for any borrow lifetime,
    // which tokio::spawn checks the same way axum does.
    #[tokio::test]
    async fn test_create_group_future_is_spawnable() {
        let db = Arc::new(MemoryDb::new());
        db.add_friend_link("row1", "u2");
        db.add_friend_link("row2", "u3");
        let service = GroupService::new(db);

        let group = tokio::spawn(async move {
            let ids = vec!["row1".to_string(), "row2".to_string()];
            service
                .create_group("Trip", None, &ids, &creator("u1"))
                .await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(group.members, vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_unique_members_drops_empty_ids() {
        let members = unique_members("u1", vec![String::new(), "u2".to_string()]);
        assert_eq!(members, vec!["u1", "u2"]);
    }
}
