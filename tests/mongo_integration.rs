// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MongoDB integration tests.
//!
//! These tests need a running MongoDB and are skipped unless
//! `MONGO_TEST_URI` is set, e.g.:
//!
//!   MONGO_TEST_URI=mongodb://localhost:27017/storycraft_test cargo test
//!
//! Every test uses fresh ids and usernames, so runs do not interfere.

use bson::oid::ObjectId;
use storycraft::config::Config;
use storycraft::db::Database;
use storycraft::error::AppError;
use storycraft::models::{Chapter, Character, CharacterCategory, Role, Story, StoryUpdate, User};

mod common;

async fn test_db() -> Database {
    let config = Config {
        mongo_uri: std::env::var("MONGO_TEST_URI").unwrap(),
        ..Config::default()
    };
    Database::connect(&config)
        .await
        .expect("Failed to connect to MongoDB")
}

fn unique_username() -> String {
    format!("user-{}", ObjectId::new().to_hex())
}

#[tokio::test]
async fn test_user_roundtrip_and_unique_username() {
    require_mongo!();
    let db = test_db().await;

    let username = unique_username();
    let user = User::new(
        "Test".to_string(),
        username.clone(),
        "hash".to_string(),
        Role::Writer,
    );
    db.insert_user(&user).await.unwrap();

    let found = db.find_user_by_username(&username).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.created_at, user.created_at);

    let dup = User::new(String::new(), username, "hash2".to_string(), Role::Reader);
    let err = db.insert_user(&dup).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == AppError::USERNAME_TAKEN));

    let updated = db
        .set_profile_pic(user.id, "/uploads/profile_pics/x.png")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        updated.profile_pic.as_deref(),
        Some("/uploads/profile_pics/x.png")
    );

    assert!(db.delete_user(user.id).await.unwrap());
    assert!(db.get_user(user.id).await.unwrap().is_none());
    assert!(db
        .set_profile_pic(user.id, "/uploads/profile_pics/y.png")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_story_updates_touch_only_their_slice() {
    require_mongo!();
    let db = test_db().await;

    let author = ObjectId::new();
    let story = Story::new("Draft".to_string(), None, None, author);
    db.insert_story(&story).await.unwrap();

    let characters = vec![Character {
        name: "Aria".to_string(),
        details: None,
        profile_pic_url: None,
        category: CharacterCategory::Lead,
    }];
    db.update_story(story.id, StoryUpdate::Characters(characters.clone()))
        .await
        .unwrap()
        .unwrap();

    let chapters = vec![Chapter {
        chapter_title: "One".to_string(),
        chapter_content: "Text".to_string(),
    }];
    db.update_story(story.id, StoryUpdate::Chapters(chapters.clone()))
        .await
        .unwrap()
        .unwrap();

    let updated = db
        .update_story(
            story.id,
            StoryUpdate::Cover {
                title: Some("Final".to_string()),
                cover_page_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.characters, characters);
    assert_eq!(updated.chapters, chapters);
    assert!(updated.cover_page_url.is_none());
    assert!(updated.updated_at >= story.updated_at);

    let missing = db
        .update_story(ObjectId::new(), StoryUpdate::Chapters(Vec::new()))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_stories_by_author_sorted() {
    require_mongo!();
    let db = test_db().await;

    let author = ObjectId::new();
    let older = Story::new("Older".to_string(), None, None, author);
    db.insert_story(&older).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = Story::new("Newer".to_string(), None, None, author);
    db.insert_story(&newer).await.unwrap();
    db.insert_story(&Story::new("Other".to_string(), None, None, ObjectId::new()))
        .await
        .unwrap();

    let ids: Vec<ObjectId> = db
        .stories_by_author(author)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}
