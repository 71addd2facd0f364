#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use file_shelf::config::ShelfConfig;
use file_shelf::entities::{posts, products, users};
use file_shelf::infrastructure::database::run_migrations;
use file_shelf::services::file_registry::{FileContent, FileRegistry};
use file_shelf::services::file_service::FileService;
use file_shelf::services::storage::StorageService;
use file_shelf::utils::auth::create_jwt;
use file_shelf::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, IntoActiveModel, Set};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

/// In-memory object store. Writes and deletes can be made to fail on demand.
#[derive(Default)]
pub struct MockStorageService {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MockStorageService {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn put_file(&self, path: &str, data: Bytes) -> anyhow::Result<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("storage unavailable"));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(path.to_string())
    }

    async fn delete_file(&self, path: &str) -> anyhow::Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("storage unavailable"));
        }
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(self.contains(path))
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub storage: Arc<MockStorageService>,
    pub token: String,
    pub admin: users::Model,
}

pub fn test_config() -> ShelfConfig {
    ShelfConfig {
        jwt_secret: TEST_SECRET.to_string(),
        expose_raw_fields: true,
        max_file_size: 1024 * 1024,
        ..ShelfConfig::default()
    }
}

pub async fn setup_app() -> TestApp {
    setup_app_with(test_config()).await
}

pub async fn setup_app_with(config: ShelfConfig) -> TestApp {
    let db = setup_test_db().await;
    let storage = Arc::new(MockStorageService::default());
    let admin = seed_user(&db, "admin", "admin").await;
    let token = create_jwt(admin.id, &config.jwt_secret).unwrap();

    let file_service = Arc::new(FileService::new(
        db.clone(),
        storage.clone(),
        config.clone(),
    ));
    let state = AppState {
        db: db.clone(),
        storage: storage.clone(),
        file_service,
        config,
    };

    TestApp {
        app: create_app(state),
        db,
        storage,
        token,
        admin,
    }
}

impl TestApp {
    pub fn file_service(&self) -> FileService {
        FileService::new(self.db.clone(), self.storage.clone(), test_config())
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", self.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(&self, uri: &str, parts: Vec<Part>) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body(parts);
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Content-Type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

pub enum Part {
    Text(&'static str, String),
    File {
        name: &'static str,
        filename: Option<String>,
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn file(filename: &str, content_type: &str, data: &[u8]) -> Self {
        Part::File {
            name: "file",
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.to_vec(),
        }
    }
}

const BOUNDARY: &str = "----shelfboundary7MA4YWxkTrZu0gW";

pub fn multipart_body(parts: Vec<Part>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                let disposition = match filename {
                    Some(f) => format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, f
                    ),
                    None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
                };
                body.extend_from_slice(disposition.as_bytes());
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(&data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub async fn seed_user(db: &DatabaseConnection, username: &str, role: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        name: Set(username.to_string()),
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        role: Set(role.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_post(db: &DatabaseConnection, title: &str) -> posts::Model {
    let now = Utc::now();
    posts::ActiveModel {
        title: Set(title.to_string()),
        body: Set(format!("{} body", title)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_product(db: &DatabaseConnection, name: &str) -> products::Model {
    let now = Utc::now();
    products::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} description", name)),
        price: Set(1999),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Registers a file row and puts matching bytes into the mock store.
pub async fn seed_file(
    db: &DatabaseConnection,
    storage: &MockStorageService,
    filename: &str,
    mime_type: &str,
    size: i64,
) -> file_shelf::entities::files::Model {
    let path = format!("shelf/2025/01/{}", filename);
    storage
        .put_file(&path, Bytes::from(vec![0u8; size as usize]))
        .await
        .unwrap();
    FileRegistry::create(
        db,
        &path,
        FileContent {
            filename: filename.to_string(),
            mime_type: Some(mime_type.to_string()),
            size,
        },
    )
    .await
    .unwrap()
}

pub async fn set_created_at(
    db: &DatabaseConnection,
    file: file_shelf::entities::files::Model,
    at: DateTime<Utc>,
) -> file_shelf::entities::files::Model {
    let mut active = file.into_active_model();
    active.created_at = Set(at);
    active.update(db).await.unwrap()
}

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}
