// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store with the same semantics as the MongoDB collections.
//!
//! Used by the test suite and by `MONGO_URI=memory://` for local runs.

use crate::error::AppError;
use crate::models::{Story, StoryUpdate, User};
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<ObjectId, User>,
    /// Unique index on `username`
    usernames: DashMap<String, ObjectId>,
    stories: DashMap<ObjectId, Story>,
}

impl MemoryStore {
    // ─── User Operations ─────────────────────────────────────────

    pub fn insert_user(&self, user: &User) -> Result<(), AppError> {
        // The entry guard serializes concurrent signups for the same name.
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::BadRequest(AppError::USERNAME_TAKEN.to_string())),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(())
            }
        }
    }

    pub fn get_user(&self, id: ObjectId) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.usernames.get(username)?;
        self.get_user(id)
    }

    pub fn set_profile_pic(&self, id: ObjectId, path: &str, now: DateTime<Utc>) -> Option<User> {
        self.users.get_mut(&id).map(|mut user| {
            user.profile_pic = Some(path.to_string());
            user.updated_at = now;
            user.clone()
        })
    }

    pub fn delete_user(&self, id: ObjectId) -> bool {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.usernames.remove(&user.username);
                true
            }
            None => false,
        }
    }

    // ─── Story Operations ────────────────────────────────────────

    pub fn insert_story(&self, story: &Story) {
        self.stories.insert(story.id, story.clone());
    }

    pub fn get_story(&self, id: ObjectId) -> Option<Story> {
        self.stories.get(&id).map(|s| s.clone())
    }

    pub fn update_story(
        &self,
        id: ObjectId,
        update: StoryUpdate,
        now: DateTime<Utc>,
    ) -> Option<Story> {
        self.stories.get_mut(&id).map(|mut story| {
            story.apply(update, now);
            story.clone()
        })
    }

    pub fn stories_by_author(&self, author: ObjectId) -> Vec<Story> {
        let mut stories: Vec<Story> = self
            .stories
            .iter()
            .filter(|entry| entry.author == author)
            .map(|entry| entry.value().clone())
            .collect();
        stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        stories
    }
}
