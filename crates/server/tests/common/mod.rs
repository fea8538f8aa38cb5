//! Shared test harness: a fully wired application over a temp filesystem
//! backend and an in-memory metadata store.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use holdfast_core::{AppConfig, Blob};
use holdfast_metadata::BlobRepo;
use holdfast_server::{AppState, build_state, create_router};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _root: TempDir,
}

pub async fn test_app() -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let config = AppConfig::for_testing(root.path());
    let state = build_state(config).await.unwrap();
    let router = create_router(state.clone());
    TestApp {
        state,
        router,
        _root: root,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Upload bytes into the default backend and create the blob row.
    pub async fn upload(&self, filename: &str, bytes: Bytes) -> Blob {
        let handle = self
            .state
            .registry
            .get(&self.state.config.service.default_backend)
            .unwrap();
        let mut blob = Blob::new(&self.state.config.service);
        holdfast_media::blobs::upload(
            &self.state.media,
            handle.store.as_ref(),
            &mut blob,
            filename,
            bytes,
        )
        .await
        .unwrap();
        self.state.metadata.create_blob(&blob).await.unwrap();
        blob
    }
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Synthesize a small PNG with a gradient so transformations have real
/// pixel content to chew on.
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let mut img = image::RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128]);
    }
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    Bytes::from(out)
}
