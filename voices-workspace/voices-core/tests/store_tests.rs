// tests/store_tests.rs
// SQLite record store: likes clamping, filters, ordering, search, updates.

use chrono::{Duration, Utc};
use voices_core::services::store::{
    FieldUpdate, InteractionType, NewSubmission, RecordStore, SqliteStore, SubmissionFilter, UserProfile,
};
use voices_core::{Category, ContentType, Language};

fn new_sub(user: &str, title: &str, content: &str, language: Language) -> NewSubmission {
    NewSubmission {
        user_id: user.into(),
        title: title.into(),
        content: content.into(),
        content_type: ContentType::Proverb,
        language,
        dialect: None,
        english_translation: None,
        ai_translated: false,
        category: None,
        ai_categorized: false,
        audio_url: None,
        featured: false,
        location: None,
        cultural_context: None,
    }
}

#[test]
fn test_likes_never_go_negative() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store
        .append(&new_sub("u1", "Rain", "Boond boond se sagar banta hai", Language::Hindi))
        .unwrap();

    assert_eq!(store.add_likes(&id, 2).unwrap(), Some(2));
    assert_eq!(store.add_likes(&id, -5).unwrap(), Some(0));
    assert_eq!(store.add_likes(&id, -1).unwrap(), Some(0));
    assert_eq!(store.get(&id).unwrap().unwrap().likes, 0);
    assert_eq!(store.add_likes("no-such-id", 1).unwrap(), None);
}

#[test]
fn test_repeated_increments_are_all_counted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voices.db");
    let id = {
        let store = SqliteStore::open(&path).unwrap();
        store
            .append(&new_sub("u1", "Rain", "Boond boond", Language::Hindi))
            .unwrap()
    };

    // Two connections to the same file, interleaved.
    let a = SqliteStore::open(&path).unwrap();
    let b = SqliteStore::open(&path).unwrap();
    for _ in 0..25 {
        a.add_likes(&id, 1).unwrap();
        b.add_likes(&id, 1).unwrap();
    }
    assert_eq!(a.get(&id).unwrap().unwrap().likes, 50);
}

#[test]
fn test_query_is_newest_first_and_filtered() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();
    let old = store
        .append_at(&new_sub("u1", "Old", "a", Language::Tamil), now - Duration::days(3))
        .unwrap();
    let mid = store
        .append_at(&new_sub("u2", "Mid", "b", Language::Hindi), now - Duration::days(2))
        .unwrap();
    let new = store
        .append_at(&new_sub("u1", "New", "c", Language::Hindi), now - Duration::days(1))
        .unwrap();

    let all = store.query(&SubmissionFilter::default(), None).unwrap();
    let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![new.as_str(), mid.as_str(), old.as_str()]);

    let limited = store.query(&SubmissionFilter::default(), Some(2)).unwrap();
    assert_eq!(limited.len(), 2);

    let mine = store.query(&SubmissionFilter::by_user("u1"), None).unwrap();
    assert_eq!(mine.len(), 2);

    let hindi_u1 = store
        .query(
            &SubmissionFilter {
                user_id: Some("u1".into()),
                language: Some(Language::Hindi),
                ..SubmissionFilter::default()
            },
            None,
        )
        .unwrap();
    assert_eq!(hindi_u1.len(), 1);
    assert_eq!(hindi_u1[0].id, new);
}

#[test]
fn test_search_is_case_insensitive_over_title_content_translation() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut with_translation = new_sub("u1", "Paani", "Jal hi jeevan hai", Language::Hindi);
    with_translation.english_translation = Some("Water is LIFE".into());
    store.append(&with_translation).unwrap();
    store
        .append(&new_sub("u2", "The Clever Crow", "A crow dropped pebbles", Language::English))
        .unwrap();

    assert_eq!(store.search("life", &SubmissionFilter::default()).unwrap().len(), 1);
    assert_eq!(store.search("CROW", &SubmissionFilter::default()).unwrap().len(), 1);
    assert_eq!(store.search("jeevan", &SubmissionFilter::default()).unwrap().len(), 1);
    assert!(store.search("elephant", &SubmissionFilter::default()).unwrap().is_empty());
    assert!(store
        .search("crow", &SubmissionFilter::by_user("u1"))
        .unwrap()
        .is_empty());
}

#[test]
fn test_update_field_leaves_id_and_timestamp_alone() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store
        .append(&new_sub("u1", "Rain", "Boond boond", Language::Hindi))
        .unwrap();
    let before = store.get(&id).unwrap().unwrap();

    assert!(store
        .update_field(
            &id,
            FieldUpdate::Category {
                category: Some(Category::Nature),
                ai_categorized: false,
            },
        )
        .unwrap());
    assert!(store.update_field(&id, FieldUpdate::Featured(true)).unwrap());
    assert!(!store
        .update_field("missing", FieldUpdate::Title("x".into()))
        .unwrap());

    let after = store.get(&id).unwrap().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.timestamp, before.timestamp);
    assert_eq!(after.category, Some(Category::Nature));
    assert!(after.featured);
    assert_eq!(store.query(&SubmissionFilter::featured(), None).unwrap().len(), 1);
}

#[test]
fn test_interactions_and_profiles() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store
        .append(&new_sub("u1", "Rain", "Boond boond", Language::Hindi))
        .unwrap();
    store.record_interaction("u2", &id, InteractionType::Like).unwrap();
    store.record_interaction("u3", &id, InteractionType::Share).unwrap();
    let kinds: Vec<InteractionType> = store
        .interactions_for(&id)
        .unwrap()
        .iter()
        .map(|i| i.kind)
        .collect();
    assert_eq!(kinds, vec![InteractionType::Like, InteractionType::Share]);

    let mut profile = UserProfile {
        user_id: "u1".into(),
        display_name: "Meera".into(),
        native_language: Some(Language::Hindi),
        location: None,
        joined_at: Utc::now(),
    };
    store.upsert_profile(&profile).unwrap();
    profile.display_name = "Meera K".into();
    store.upsert_profile(&profile).unwrap();
    let got = store.profile("u1").unwrap().unwrap();
    assert_eq!(got.display_name, "Meera K");
    assert_eq!(store.profiles().unwrap().len(), 1);
}
