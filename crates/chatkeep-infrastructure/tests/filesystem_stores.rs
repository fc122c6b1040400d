//! End-to-end tests of the stores over real files.

use chatkeep_core::config::{AutosaveConfig, MemoryConfig};
use chatkeep_core::memory::VectorMemoryStore;
use chatkeep_core::session::{AutosaveController, ExportFormat, MessageRole, SessionStore};
use chatkeep_infrastructure::{JsonSessionRepository, JsonVectorRepository};
use serde_json::{Map, json};
use std::sync::Arc;
use tempfile::TempDir;

async fn session_store(dir: &TempDir) -> SessionStore {
    let repository = JsonSessionRepository::new(dir.path()).await.unwrap();
    SessionStore::new(Arc::new(repository))
}

#[tokio::test]
async fn test_saved_conversation_reloads_in_fresh_store() {
    let temp_dir = TempDir::new().unwrap();

    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "My name is Arme");
    store.add_message(MessageRole::Assistant, "Hi Arme");
    store.save("s1").await.unwrap();
    let original = store.history().to_vec();

    let mut fresh = session_store(&temp_dir).await;
    fresh.load("s1").await.unwrap();

    assert_eq!(fresh.history(), original.as_slice());
    assert_eq!(fresh.metadata().message_count, 2);
    assert_eq!(fresh.session_name(), Some("s1"));
    assert!(!fresh.is_dirty());
}

#[tokio::test]
async fn test_session_file_layout() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "hello");

    let path = store.save("My Chat").await.unwrap();
    assert_eq!(path, temp_dir.path().join("My_Chat.json"));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["metadata"]["sessionName"], "My_Chat");
    assert_eq!(raw["metadata"]["originalName"], "My Chat");
    assert_eq!(raw["metadata"]["messageCount"], 1);
    assert_eq!(raw["conversationHistory"][0]["role"], "user");
    assert!(raw["conversationHistory"][0]["messageId"].is_string());
}

#[tokio::test]
async fn test_latest_session_skips_corrupted_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "still here");
    store.save("valid").await.unwrap();
    std::fs::write(temp_dir.path().join("corrupted.json"), "{\"conversationHistory\": [").unwrap();

    let latest = store.last_modified_session().await.unwrap();
    assert_eq!(latest.as_deref(), Some("valid"));

    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "valid");
}

#[tokio::test]
async fn test_bad_file_load_keeps_active_session() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "first");
    store.add_message(MessageRole::Assistant, "second");
    store.save("current").await.unwrap();
    store.add_message(MessageRole::User, "unsaved");

    std::fs::write(temp_dir.path().join("wrong_shape.json"), r#"{"messages": []}"#).unwrap();
    std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

    for name in ["wrong_shape", "broken"] {
        let err = store.load(name).await.unwrap_err();
        assert!(err.is_invalid_format(), "{}: {}", name, err);
        assert_eq!(store.history().len(), 3);
        assert_eq!(store.history()[2].content, "unsaved");
        assert_eq!(store.session_name(), Some("current"));
        assert!(store.is_dirty());
    }
}

#[tokio::test]
async fn test_session_named_export_is_listed_but_exports_are_not() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "Q4 numbers");
    store.save("sales export 2024").await.unwrap();
    store
        .export(ExportFormat::Json, Some("sales_export_1700000000.json"))
        .await
        .unwrap();

    let listed = store.list_sessions().await.unwrap();
    let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["sales_export_2024"]);

    let latest = store.last_modified_session().await.unwrap();
    assert_eq!(latest.as_deref(), Some("sales_export_2024"));
}

#[tokio::test]
async fn test_backup_leaves_primary_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "first");
    let primary = store.save("notes").await.unwrap();
    let before = std::fs::read(&primary).unwrap();

    store.add_message(MessageRole::Assistant, "second");
    let backup = store.create_backup().await.unwrap().unwrap();

    assert!(backup.starts_with(temp_dir.path().join("backups")));
    assert_eq!(std::fs::read(&primary).unwrap(), before);

    let file_name = backup.file_name().unwrap().to_string_lossy().into_owned();
    let mut restored = session_store(&temp_dir).await;
    restored.restore_backup(&file_name).await.unwrap();
    assert_eq!(restored.history().len(), 2);
    assert_eq!(restored.session_name(), Some("notes"));
}

#[tokio::test]
async fn test_exit_autosave_writes_one_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = session_store(&temp_dir).await;
    store.add_message(MessageRole::User, "unsaved thought");

    let controller = AutosaveController::new(store, &AutosaveConfig::default());
    let first = controller.flush_and_close().await.unwrap();
    let second = controller.flush_and_close().await.unwrap();

    let path = first.unwrap();
    assert!(second.is_none());
    assert!(
        path.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("auto_save_")
    );

    let json_files = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|ext| ext == "json")
        })
        .count();
    assert_eq!(json_files, 1);
}

#[tokio::test]
async fn test_vector_search_finds_stored_vector() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vectors.json");
    let repository = Arc::new(JsonVectorRepository::new(path.clone()));
    let mut store = VectorMemoryStore::new(repository.clone(), &MemoryConfig::default());

    let first = vec![0.9, 0.1, 0.0, 0.2];
    store.store("first", first.clone(), Map::new()).await.unwrap();
    store
        .store("second", vec![0.0, 1.0, 0.3, 0.0], Map::new())
        .await
        .unwrap();
    store
        .store("third", vec![-0.5, 0.0, 0.8, 0.1], Map::new())
        .await
        .unwrap();

    let results = store.search(&first, 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "first");

    store.save().await.unwrap();
    let mut reopened = VectorMemoryStore::new(repository, &MemoryConfig::default());
    let stats = reopened.stats().await.unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.dimensions, 4);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["count"], 3);
    assert_eq!(raw["metadata"]["first"]["dimensions"], 4);
}

#[tokio::test]
async fn test_malformed_vector_file_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vectors.json");
    std::fs::write(&path, "not json at all").unwrap();

    let repository = Arc::new(JsonVectorRepository::new(path));
    let mut store = VectorMemoryStore::new(repository, &MemoryConfig::default());

    assert_eq!(store.stats().await.unwrap().count, 0);
    let mut metadata = Map::new();
    metadata.insert("text".to_string(), json!("fresh start"));
    store.store("a", vec![1.0, 0.0], metadata).await.unwrap();
    assert_eq!(store.len(), 1);
}
