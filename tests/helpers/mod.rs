//! Test helper utilities: a full router wired against mocked upstreams

#![allow(dead_code)]

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use dress_tryon::{app_state::AppState, config::AppConfig, routes};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::fixtures;

/// Knobs for a test instance.
pub struct TestOptions {
    pub mode: &'static str,
    pub telegram: bool,
    pub watermark_font: Option<PathBuf>,
    /// Overrides the face API base URL (defaults to the mock server).
    pub face_api_base_url: Option<String>,
    /// Overrides the contact log path (defaults to a file in the scratch dir).
    pub contact_log_path: Option<PathBuf>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            mode: "poll",
            telegram: false,
            watermark_font: None,
            face_api_base_url: None,
            contact_log_path: None,
        }
    }
}

/// A running router plus the mocks and scratch space behind it.
pub struct TestApp {
    pub server: TestServer,
    pub router: Router,
    pub upstream: MockServer,
    pub telegram: MockServer,
    pub dir: TempDir,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn spawn(options: TestOptions) -> Self {
        let upstream = MockServer::start().await;
        let telegram = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut vars = vec![
            ("FACE_API_KEY", fixtures::API_KEY.to_string()),
            (
                "FACE_API_BASE_URL",
                options
                    .face_api_base_url
                    .clone()
                    .unwrap_or_else(|| upstream.uri()),
            ),
            ("FACE_API_MODE", options.mode.to_string()),
            ("POLL_INTERVAL_MS", "0".to_string()),
            ("DRESS_IMAGE_BASE_URL", "https://assets.test/dresses".to_string()),
            ("UPLOAD_DIR", path_var(&dir.path().join("uploads"))),
            ("RESULTS_DIR", path_var(&dir.path().join("results"))),
            (
                "CONTACT_LOG_PATH",
                path_var(
                    &options
                        .contact_log_path
                        .clone()
                        .unwrap_or_else(|| dir.path().join("contacts.log")),
                ),
            ),
            ("PUBLIC_BASE_URL", fixtures::PUBLIC_BASE_URL.to_string()),
        ];

        if options.telegram {
            vars.push(("TELEGRAM_BOT_TOKEN", fixtures::BOT_TOKEN.to_string()));
            vars.push(("TELEGRAM_ADMIN_CHAT_ID", fixtures::CHAT_ID.to_string()));
            vars.push(("TELEGRAM_API_BASE_URL", telegram.uri()));
        }

        if let Some(font) = &options.watermark_font {
            vars.push(("WATERMARK_ENABLED", "true".to_string()));
            vars.push(("WATERMARK_FONT_PATH", path_var(font)));
        }

        let config: AppConfig = envy::from_iter(
            vars.into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        )
        .expect("Failed to build test config");

        let state = AppState::from_config(&config)
            .await
            .expect("Failed to build app state");
        let app = routes::router(state, &config.cors_origins);
        let server = TestServer::new(app.clone()).expect("Failed to create test server");

        Self {
            server,
            router: app,
            upstream,
            telegram,
            dir,
            config,
        }
    }

    /// Serve the router on a real socket and return its base URL.
    ///
    /// Requests sent with reqwest then carry a `Content-Length`, which the
    /// in-memory transport never sets.
    pub async fn serve_on_socket(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{addr}")
    }

    /// POST /api/tryon with the given fields.
    pub async fn submit(&self, form: MultipartForm) -> TestResponse {
        self.server.post("/api/tryon").multipart(form).await
    }

    /// URL the upstream mock serves the finished image at.
    pub fn result_image_url(&self) -> String {
        format!("{}/files/result.png", self.upstream.uri())
    }

    pub fn contact_log(&self) -> String {
        std::fs::read_to_string(&self.config.contact_log_path).unwrap_or_default()
    }

    pub fn stored_files(&self, dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Submit answers with a job id.
    pub async fn mock_submit_job(&self, job_id: &str) {
        Mock::given(method("POST"))
            .and(path("/rest_api/process"))
            .and(header("x-api-key", fixtures::API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": job_id })))
            .expect(1)
            .mount(&self.upstream)
            .await;
    }

    /// Polls answer "still processing" `pending` times, then hand out the result URL.
    pub async fn mock_poll_result(&self, pending: u64) {
        if pending > 0 {
            Mock::given(method("POST"))
                .and(path("/rest_api/process_result"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })),
                )
                .up_to_n_times(pending)
                .with_priority(1)
                .expect(pending)
                .mount(&self.upstream)
                .await;
        }

        Mock::given(method("POST"))
            .and(path("/rest_api/process_result"))
            .and(header("x-api-key", fixtures::API_KEY))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "complete", "url": self.result_image_url() })),
            )
            .expect(1)
            .mount(&self.upstream)
            .await;
    }

    /// The finished image itself.
    pub async fn mock_result_image(&self) {
        Mock::given(method("GET"))
            .and(path("/files/result.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(fixtures::create_test_png(320, 240))
                    .insert_header("content-type", "image/png"),
            )
            .mount(&self.upstream)
            .await;
    }
}

/// A multipart form carrying a small PNG as `photo`.
pub fn photo_form(dress: Option<&str>, contact: Option<&str>) -> MultipartForm {
    let part = Part::bytes(fixtures::create_test_png(64, 64))
        .file_name("me.png")
        .mime_type("image/png");
    let mut form = MultipartForm::new().add_part("photo", part);
    if let Some(dress) = dress {
        form = form.add_text("dress", dress);
    }
    if let Some(contact) = contact {
        form = form.add_text("contact", contact);
    }
    form
}

fn path_var(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Matches requests whose raw body contains `needle`, binary-safe for multipart uploads.
pub struct BodyContains(Vec<u8>);

impl wiremock::Match for BodyContains {
    fn matches(&self, request: &wiremock::Request) -> bool {
        request
            .body
            .windows(self.0.len())
            .any(|window| window == self.0.as_slice())
    }
}

pub fn body_contains(needle: impl AsRef<str>) -> BodyContains {
    body_contains_bytes(needle.as_ref().as_bytes())
}

pub fn body_contains_bytes(needle: &[u8]) -> BodyContains {
    BodyContains(needle.to_vec())
}
