// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for test mode and tests.
//!
//! Rows live for the lifetime of the process. Friend links and users are
//! seeded by the caller, since this service never writes them.

use crate::db::{DbError, GroupRepository};
use crate::models::{FriendLink, Group, Member, NewGroup};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory database.
#[derive(Default)]
pub struct MemoryDb {
    /// Groups keyed by id, with their insertion sequence for ordering
    groups: DashMap<String, (u64, Group)>,
    friend_links: DashMap<String, FriendLink>,
    users: DashMap<String, Member>,
    /// Insertion order, shared by seeded and inserted groups
    next_seq: AtomicU64,
    /// Candidate ids for inserted groups
    next_id: AtomicU64,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a friend link row.
    pub fn add_friend_link(&self, link_id: &str, friend_id: &str) {
        self.friend_links.insert(
            link_id.to_string(),
            FriendLink {
                id: link_id.to_string(),
                friend_id: Some(friend_id.to_string()),
            },
        );
    }

    /// Seed a user row.
    pub fn add_user(&self, member: Member) {
        self.users.insert(member.id.clone(), member);
    }

    /// Store a group row as-is (bypassing id assignment).
    pub fn put_group(&self, group: Group) {
        let seq = self.next_seq();
        self.groups.insert(group.id.clone(), (seq, group));
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl GroupRepository for MemoryDb {
    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, DbError> {
        Ok(self.groups.get(group_id).map(|entry| entry.1.clone()))
    }

    async fn find_groups_with_member(&self, user_id: &str) -> Result<Vec<Group>, DbError> {
        let mut matching: Vec<(u64, Group)> = self
            .groups
            .iter()
            .filter(|entry| entry.1.members.iter().any(|m| m == user_id))
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(matching.into_iter().map(|(_, group)| group).collect())
    }

    async fn insert_group(&self, group: &NewGroup) -> Result<Option<Group>, DbError> {
        let seq = self.next_seq();

        // Seeded rows may already hold a numeric id; skip past them.
        loop {
            let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
            if let Entry::Vacant(slot) = self.groups.entry(id) {
                let row = Group {
                    id: slot.key().clone(),
                    name: group.name.clone(),
                    description: group.description.clone(),
                    members: group.members.clone(),
                    created_at: Some(chrono::Utc::now().to_rfc3339()),
                };
                slot.insert((seq, row.clone()));
                return Ok(Some(row));
            }
        }
    }

    async fn find_friend_link(&self, link_id: &str) -> Result<Option<FriendLink>, DbError> {
        Ok(self.friend_links.get(link_id).map(|l| l.clone()))
    }

    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<Member>, DbError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|m| m.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_group(name: &str, members: &[&str]) -> NewGroup {
        NewGroup {
            name: name.to_string(),
            description: None,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_groups_with_member_newest_first() {
        let db = MemoryDb::new();
        db.insert_group(&new_group("First", &["u1"])).await.unwrap();
        db.insert_group(&new_group("Other", &["u2"])).await.unwrap();
        db.insert_group(&new_group("Second", &["u2", "u1"]))
            .await
            .unwrap();

        let names: Vec<String> = db
            .find_groups_with_member("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();

        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_find_users_skips_unknown_ids() {
        let db = MemoryDb::new();
        db.add_user(Member {
            id: "u1".to_string(),
            name: Some("Ana".to_string()),
            full_name: None,
            username: None,
            email: None,
        });

        let users = db
            .find_users_by_ids(&["u1".to_string(), "ghost".to_string()])
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[tokio::test]
    async fn test_insert_never_overwrites_seeded_group() {
        let db = MemoryDb::new();
        for id in ["1", "3"] {
            db.put_group(Group {
                id: id.to_string(),
                name: format!("Seeded {id}"),
                description: None,
                members: vec!["u1".to_string()],
                created_at: None,
            });
        }

        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let row = db.insert_group(&new_group(name, &["u1"])).await.unwrap().unwrap();
            ids.push(row.id);
        }

        assert_eq!(ids, vec!["2", "4", "5"]);
        assert_eq!(db.group_count(), 5);
        assert_eq!(db.find_group("3").await.unwrap().unwrap().name, "Seeded 3");

        let names: Vec<String> = db
            .find_groups_with_member("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["C", "B", "A", "Seeded 3", "Seeded 1"]);
    }
}
