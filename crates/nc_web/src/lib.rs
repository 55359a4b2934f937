use axum::{routing::get, Router};
use nc_core::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/generate", get(handlers::generate))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use nc_core::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use nc_core::{Document, DocumentStore, Error, QueryHit};
    use nc_feeds::{FeedConfig, FeedSource, IngestManager, IngestOptions, RawEntry};
    use nc_inference::models::DummyModel;
    use nc_inference::{Briefer, BriefingConfig};
    use nc_storage::MemoryStorage;
    use serde_json::Value;
    use tower::ServiceExt;

    struct OneArticle;

    #[async_trait]
    impl FeedSource for OneArticle {
        async fn fetch(&self, _url: &str, _limit: usize) -> nc_core::Result<Vec<RawEntry>> {
            Ok(vec![RawEntry {
                title: Some("Atlanta transit expands".to_string()),
                summary: Some("MARTA adds routes.".to_string()),
                link: Some("https://news.example/marta".to_string()),
                published: None,
            }])
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn upsert(&self, _documents: &[Document]) -> nc_core::Result<()> {
            Err(Error::Storage("store offline".to_string()))
        }

        async fn query(&self, _text: &str, _limit: usize) -> nc_core::Result<Vec<QueryHit>> {
            Err(Error::Storage("store offline".to_string()))
        }

        async fn delete(&self, _id: &str) -> nc_core::Result<()> {
            Ok(())
        }

        async fn count(&self) -> nc_core::Result<usize> {
            Ok(0)
        }
    }

    fn state(store: Arc<dyn DocumentStore>, dir: &tempfile::TempDir) -> AppState {
        let model = Arc::new(DummyModel::new());
        let manager = IngestManager::new(
            Arc::new(OneArticle),
            store.clone(),
            FeedConfig::inline(vec!["https://news.example/rss".to_string()]),
            dir.path().join("seen.json"),
            IngestOptions::default(),
        );
        let briefer = Briefer::new(store, model.clone(), Some(model), BriefingConfig::default());
        AppState::new(Arc::new(manager), Arc::new(briefer))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStorage::new(Arc::new(DummyModel::new())));
        let (status, body) = get_json(create_app(state(store, &dir)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Welcome"));
    }

    #[tokio::test]
    async fn test_generate_then_recap() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStorage::new(Arc::new(DummyModel::new())));
        let app = create_app(state(store, &dir));

        let (status, body) = get_json(app.clone(), "/api/generate?minutes=3&topic=general").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "daily");
        assert_eq!(body["ingested"], 1);
        assert_eq!(body["clusters"][0][0]["title"], "Atlanta transit expands");
        assert!(body["script"].as_str().unwrap().contains("Atlanta transit expands"));

        let (status, body) = get_json(app, "/api/generate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "recap");
        assert_eq!(body["ingested"], 0);
    }

    #[tokio::test]
    async fn test_bad_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStorage::new(Arc::new(DummyModel::new())));
        let app = create_app(state(store, &dir));

        let (status, body) = get_json(app.clone(), "/api/generate?minutes=16").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("between 1 and 15"));

        let (status, _) = get_json(app.clone(), "/api/generate?minutes=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(app, "/api/generate?minutes=five").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(state(Arc::new(BrokenStore), &dir));
        let (status, body) = get_json(app, "/api/generate").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("store offline"));
    }
}
