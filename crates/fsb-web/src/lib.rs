//! HTTP side of the bot: streaming and download endpoints backed by the bin
//! channel, short links, a landing page and a public stats endpoint.

mod pages;
mod range;
mod routes;
mod streaming;

use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use fsb_core::{ports::FileSource, store::Store};

pub use range::{parse_range, ByteRange};

#[derive(Clone)]
pub struct WebState {
    pub store: Store,
    pub files: Arc<dyn FileSource>,
    pub bot_username: String,
    /// Public base URL used when rendering links on web pages.
    pub public_url: String,
}

pub fn app(state: WebState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/stats", get(routes::stats))
        .route("/watch/{message_id}/{file_name}", get(routes::watch))
        .route("/dl/{message_id}/{file_name}", get(routes::download))
        .route("/thumb/{message_id}", get(routes::thumbnail))
        .route("/{file_hash}", get(routes::short_link))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `cancel` fires.
pub async fn serve(
    state: WebState,
    static_dir: impl AsRef<Path>,
    host: &str,
    port: u16,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("web server listening on {addr}");

    axum::serve(listener, app(state, static_dir))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("web server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use bytes::Bytes;
    use futures::stream;
    use tower::ServiceExt;

    use fsb_core::{
        media::{file_hash, MediaKind},
        ports::ByteStream,
        store::NewFile,
        Error,
    };

    const CONTENT: &[u8] = b"0123456789";

    struct FakeFiles {
        fail: bool,
    }

    #[async_trait]
    impl FileSource for FakeFiles {
        async fn open(&self, _file_id: &str) -> fsb_core::Result<ByteStream> {
            if self.fail {
                return Err(Error::External("telegram unavailable".into()));
            }
            let chunks: Vec<fsb_core::Result<Bytes>> = vec![
                Ok(Bytes::from_static(&CONTENT[..4])),
                Ok(Bytes::from_static(&CONTENT[4..])),
            ];
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    async fn setup(kind: MediaKind, fail: bool) -> (Router, Store, String) {
        let store = Store::in_memory().await.unwrap();
        let hash = file_hash("AgADuniq");
        store
            .record_upload(&NewFile {
                file_id: "BQACfile".into(),
                file_unique_id: "AgADuniq".into(),
                file_hash: hash.clone(),
                message_id: 77,
                user_id: 1,
                file_name: Some("clip.mp4".into()),
                file_size: CONTENT.len() as i64,
                file_type: kind,
                mime_type: Some("video/mp4".into()),
            })
            .await
            .unwrap();

        let state = WebState {
            store: store.clone(),
            files: Arc::new(FakeFiles { fail }),
            bot_username: "files_bot".into(),
            public_url: "http://localhost:8080/".into(),
        };
        (app(state, "static"), store, hash)
    }

    async fn get(router: Router, uri: &str, range: Option<&str>) -> axum::response::Response {
        let mut req = Request::builder().uri(uri);
        if let Some(r) = range {
            req = req.header(header::RANGE, r);
        }
        router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn body_of(res: axum::response::Response) -> Vec<u8> {
        to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn full_download_counts_and_sets_headers() {
        let (router, store, hash) = setup(MediaKind::Video, false).await;
        let res = get(router, &format!("/dl/77/clip.mp4?hash={hash}"), None).await;

        assert_eq!(res.status(), StatusCode::OK);
        let h = res.headers();
        assert_eq!(h[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(h[header::ACCEPT_RANGES], "bytes");
        assert_eq!(h[header::CONTENT_LENGTH], "10");
        assert_eq!(h[header::CONTENT_DISPOSITION], "attachment; filename=\"clip.mp4\"");
        assert_eq!(body_of(res).await, CONTENT);

        let file = store.find_file_by_message(77).await.unwrap().unwrap();
        assert_eq!(file.downloads, 1);
        assert_eq!(file.views, 0);
    }

    #[tokio::test]
    async fn ranged_watch_returns_partial_content() {
        let (router, store, hash) = setup(MediaKind::Video, false).await;
        let res = get(router, &format!("/watch/77/clip.mp4?hash={hash}"), Some("bytes=3-6")).await;

        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 3-6/10");
        assert_eq!(res.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(res.headers()[header::CONTENT_DISPOSITION], "inline; filename=\"clip.mp4\"");
        assert_eq!(body_of(res).await, b"3456");

        let file = store.find_file_by_message(77).await.unwrap().unwrap();
        assert_eq!(file.views, 1);
    }

    #[tokio::test]
    async fn open_ended_range_runs_to_the_end() {
        let (router, _, hash) = setup(MediaKind::Video, false).await;
        let res = get(router, &format!("/watch/77/clip.mp4?hash={hash}"), Some("bytes=8-")).await;
        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 8-9/10");
        assert_eq!(body_of(res).await, b"89");
    }

    #[tokio::test]
    async fn range_past_the_end_is_unsatisfiable() {
        let (router, _, hash) = setup(MediaKind::Video, false).await;
        let res = get(router, &format!("/dl/77/clip.mp4?hash={hash}"), Some("bytes=10-")).await;
        assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes */10");
    }

    #[tokio::test]
    async fn request_validation() {
        let (router, store, hash) = setup(MediaKind::Video, false).await;

        let res = get(router.clone(), "/dl/77/clip.mp4", None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = get(router.clone(), &format!("/dl/abc/clip.mp4?hash={hash}"), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = get(router.clone(), &format!("/dl/78/clip.mp4?hash={hash}"), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = get(router, "/dl/77/clip.mp4?hash=000000000000", None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(res).await, b"Invalid hash");

        let file = store.find_file_by_message(77).await.unwrap().unwrap();
        assert_eq!(file.downloads, 0);
    }

    #[tokio::test]
    async fn telegram_failure_is_a_500() {
        let (router, _, hash) = setup(MediaKind::Video, true).await;
        let res = get(router, &format!("/dl/77/clip.mp4?hash={hash}"), None).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn short_link_renders_card() {
        let (router, _, hash) = setup(MediaKind::Video, false).await;
        let res = get(router.clone(), &format!("/{hash}"), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8(body_of(res).await).unwrap();
        assert!(html.contains("clip.mp4"));
        assert!(html.contains(&format!("http://localhost:8080/dl/77/clip.mp4?hash={hash}")));

        let res = get(router, "/ffffffffffff", None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn thumbnails_only_for_photos() {
        let (router, _, _) = setup(MediaKind::Video, false).await;
        assert_eq!(get(router, "/thumb/77", None).await.status(), StatusCode::NOT_FOUND);

        let (router, _, _) = setup(MediaKind::Photo, false).await;
        let res = get(router, "/thumb/77", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(body_of(res).await, CONTENT);
    }

    #[tokio::test]
    async fn stats_and_index() {
        let (router, store, _) = setup(MediaKind::Video, false).await;
        store.refresh_bot_stats().await.unwrap();

        let res = get(router.clone(), "/stats", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_of(res).await).unwrap();
        assert_eq!(json["total_files"], 1);
        assert_eq!(json["total_users"], 1);
        assert!(json["uptime"].as_str().unwrap().ends_with('s'));

        let res = get(router, "/", None).await;
        let html = String::from_utf8(body_of(res).await).unwrap();
        assert!(html.contains("files_bot"));
    }
}
