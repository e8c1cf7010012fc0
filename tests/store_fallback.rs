//! The engine must stay fully functional while its durable medium is down.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use brezza::{
    ContentGenerator, Engine, EventFilter, FileMedium, GenerateError, GeneratedContent,
    MemoryMedium, RouteParams, RouteRules, Settings, StorageMedium, TieredStore, keys,
};

struct EchoGenerator;

#[async_trait]
impl ContentGenerator for EchoGenerator {
    async fn generate_static(&self, route: &str) -> Result<GeneratedContent, GenerateError> {
        Ok(GeneratedContent {
            title: route.to_string(),
            description: String::new(),
            body: format!("<main>{route}</main>"),
            metadata: serde_json::Map::new(),
        })
    }

    async fn generate_dynamic(
        &self,
        route: &str,
        _params: &RouteParams,
    ) -> Result<GeneratedContent, GenerateError> {
        self.generate_static(route).await
    }
}

/// A file medium rooted at a regular file instead of a directory, so every
/// operation fails the way a full or revoked disk would.
fn broken_file_medium(dir: &std::path::Path) -> Arc<dyn StorageMedium> {
    let blocked = dir.join("blocked");
    std::fs::write(&blocked, b"not a directory").unwrap();
    Arc::new(FileMedium::new(blocked))
}

async fn degraded_engine(dir: &std::path::Path) -> Engine {
    let store = Arc::new(TieredStore::new(vec![
        broken_file_medium(dir),
        Arc::new(MemoryMedium::new()),
    ]));
    Engine::open_with_store(
        &Settings::default(),
        RouteRules::new(["/docs"], ["/search"]),
        Arc::new(EchoGenerator),
        store,
    )
    .await
}

#[tokio::test]
async fn resolution_succeeds_over_the_fallback_medium() {
    let dir = tempfile::tempdir().unwrap();
    let engine = degraded_engine(dir.path()).await;

    let artifact = engine
        .resolver()
        .resolve("/docs", &RouteParams::new())
        .await
        .unwrap();
    assert_eq!(artifact.title, "/docs");

    // The artifact fell back to memory but stays readable.
    assert!(
        engine
            .cache()
            .get::<brezza::PageArtifact>(&keys::ssg("/docs"))
            .await
            .is_some()
    );
}

#[tokio::test]
async fn writes_fall_back_and_stay_readable() {
    let dir = tempfile::tempdir().unwrap();
    let engine = degraded_engine(dir.path()).await;

    assert!(
        engine
            .store()
            .set(keys::USER_PREFERENCES, &json!({ "theme": "dark" }))
            .await
    );

    let prefs: serde_json::Value = engine.store().get(keys::USER_PREFERENCES).await.unwrap();
    assert_eq!(prefs["theme"], json!("dark"));

    // Enumeration tolerates the broken medium and reports the fallback's keys.
    assert_eq!(
        engine.store().keys("user:").await,
        vec![keys::USER_PREFERENCES.to_string()]
    );
}

#[tokio::test]
async fn ledger_keeps_accepting_events_while_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let engine = degraded_engine(dir.path()).await;

    assert!(!engine.ledger().screen_input("<iframe src=x>", "feed").await);
    assert_eq!(engine.ledger().events(&EventFilter::default()).len(), 1);
    // Persistence reached the fallback medium, so no failure is recorded.
    assert_eq!(engine.ledger().persist_failures(), 0);
}
