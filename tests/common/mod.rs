#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// A server process on its own port and upload directory, killed on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub upload_dir: PathBuf,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let upload_dir = std::env::temp_dir().join(format!(
            "car-market-it-{}-{}",
            std::process::id(),
            port
        ));

        let child = Command::new(env!("CARGO_BIN_EXE_car-market-api"))
            .args(["--memory", "--host", "127.0.0.1", "--port", &port.to_string()])
            .env("APP_ENV", "development")
            .env("DATABASE_BACKEND", "memory")
            .env("JWT_SECRET", "integration-test-secret")
            .env("UPLOAD_DIR", &upload_dir)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            upload_dir,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether an `/uploads/<name>` reference exists on disk
    pub fn stored(&self, image_url: &str) -> bool {
        image_url
            .strip_prefix("/uploads/")
            .map(|name| self.upload_dir.join(name).exists())
            .unwrap_or(false)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Registration payload with a collision-free email and username
pub fn registration(tag: &str) -> Value {
    let unique = format!("{}{}", tag, rand_suffix());
    json!({
        "username": unique,
        "email": format!("{}@example.com", unique),
        "password": "password123",
        "confirmed_password": "password123"
    })
}

/// Register and log in a fresh user; returns (email, access_token, refresh_token)
pub async fn register_and_login(server: &TestServer, client: &Client, tag: &str) -> Result<(String, String, String)> {
    let payload = registration(tag);
    let email = payload["email"].as_str().context("email")?.to_string();

    let res = client.post(server.url("/register")).json(&payload).send().await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.text().await?);

    let res = client
        .post(server.url("/login"))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.text().await?);

    let tokens: Value = res.json().await?;
    Ok((
        email,
        tokens["access_token"].as_str().context("access_token")?.to_string(),
        tokens["refresh_token"].as_str().context("refresh_token")?.to_string(),
    ))
}

pub fn camry() -> Value {
    json!({
        "make": "Toyota",
        "model": "Camry",
        "year": 2020,
        "price": 25000,
        "mileage": 15000,
        "description": "Well maintained sedan",
        "color": "Silver",
        "fuel_type": "Gasoline",
        "transmission": "Automatic",
        "image": "https://cdn.example.com/camry.jpg"
    })
}

/// Text parts of a multipart listing form
pub fn camry_form() -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("make", "Toyota")
        .text("model", "Camry")
        .text("year", "2020")
        .text("price", "25000")
        .text("mileage", "15000")
        .text("color", "Silver")
        .text("fuel_type", "Gasoline")
        .text("transmission", "Automatic")
}

pub fn image_part(bytes: &[u8], file_name: &str, mime: &str) -> Result<reqwest::multipart::Part> {
    Ok(reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)?)
}

fn rand_suffix() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}{}", nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}
