//! Integration tests for the catalog server.
//!
//! These tests spawn the `catalog-server` binary and drive it over HTTP.
//! They are ignored by default. Build the binary first, then run them with
//! `cargo build -p catalog-server && cargo test -p catalog-integration-tests -- --ignored`;
//! a missing binary fails the run.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl Product {
    pub fn new(id: i64, name: &str, price: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
}

// ============================================================================
// Test Server
// ============================================================================

/// A running server process, killed on drop.
pub struct TestServer {
    process: Child,
    pub base_url: String,
    pub port: u16,
}

impl TestServer {
    /// Start a server with the in-memory backend.
    pub async fn start_memory(port: u16) -> Result<Self> {
        Self::start(port, &["--backend", "memory"]).await
    }

    /// Start a server with the SQLite backend on the given database file.
    pub async fn start_sqlite(port: u16, database: &Path) -> Result<Self> {
        let database = database.to_str().context("non UTF-8 database path")?;
        Self::start(port, &["--backend", "sqlite", "--database", database]).await
    }

    async fn start(port: u16, args: &[&str]) -> Result<Self> {
        let server_binary = find_server_binary()?;

        let process = Command::new(&server_binary)
            .args(args)
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start server: {:?}", server_binary))?;

        let server = Self {
            process,
            base_url: format!("http://127.0.0.1:{}", port),
            port,
        };

        // Wait for server to be ready
        server.wait_for_ready().await?;

        Ok(server)
    }

    /// Wait for the server to be ready to accept connections.
    async fn wait_for_ready(&self) -> Result<()> {
        let client = Client::new();
        let url = format!("{}/health", self.base_url);

        for _ in 0..50 {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        bail!("Server failed to start within 5 seconds")
    }

    /// Get an HTTP client for this server.
    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Find the server binary in the target directory.
fn find_server_binary() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CATALOG_SERVER_BIN") {
        return Ok(PathBuf::from(path));
    }

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());

    // Try debug build first, then release
    let candidates = [
        Path::new(&manifest_dir).join("../../target/debug/catalog-server"),
        Path::new(&manifest_dir).join("../../target/debug/catalog-server.exe"),
        Path::new(&manifest_dir).join("../../target/release/catalog-server"),
        Path::new(&manifest_dir).join("../../target/release/catalog-server.exe"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.canonicalize()?);
        }
    }

    bail!(
        "Could not find catalog-server binary. Run 'cargo build -p catalog-server' first. Searched in: {:?}",
        candidates
    )
}

// ============================================================================
// Test Client
// ============================================================================

/// HTTP client for testing the catalog API.
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Ok(resp.json().await?)
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        let resp = self.client.get(self.url("/")).send().await?;
        if !resp.status().is_success() {
            bail!("List failed: {}", resp.text().await?);
        }
        Ok(resp.json().await?)
    }

    pub async fn get(&self, id: i64) -> Result<(StatusCode, serde_json::Value)> {
        let resp = self
            .client
            .get(self.url(&format!("/product/{}", id)))
            .send()
            .await?;
        Ok((resp.status(), resp.json().await?))
    }

    pub async fn create(&self, product: &Product) -> Result<(StatusCode, serde_json::Value)> {
        let resp = self
            .client
            .post(self.url("/product"))
            .json(product)
            .send()
            .await?;
        Ok((resp.status(), resp.json().await?))
    }

    pub async fn update(&self, product: &Product) -> Result<(StatusCode, serde_json::Value)> {
        let resp = self
            .client
            .put(self.url(&format!("/product/{}", product.id)))
            .json(product)
            .send()
            .await?;
        Ok((resp.status(), resp.json().await?))
    }

    pub async fn delete(&self, id: i64) -> Result<(StatusCode, serde_json::Value)> {
        let resp = self
            .client
            .delete(self.url(&format!("/product/{}", id)))
            .send()
            .await?;
        Ok((resp.status(), resp.json().await?))
    }
}

/// Wait for a process to exit on its own.
pub async fn wait_for_exit(process: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(status) = process.try_wait()? {
            return Ok(status);
        }
        if tokio::time::Instant::now() >= deadline {
            let _ = process.kill();
            bail!("process did not exit within {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, Ordering};
    use tempfile::TempDir;

    // Port counter to avoid conflicts between parallel tests
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18300);

    fn next_port() -> u16 {
        PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    #[tokio::test]
    #[ignore = "requires a built catalog-server binary"]
    async fn test_health_reports_backend() {
        let server = TestServer::start_memory(next_port()).await.unwrap();

        let health = server.client().health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.backend, "memory");
    }

    #[tokio::test]
    #[ignore = "requires a built catalog-server binary"]
    async fn test_memory_crud_workflow() {
        let server = TestServer::start_memory(next_port()).await.unwrap();
        let client = server.client();

        // 1. Seeded and sorted
        let products = client.list().await.unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products[0], Product::new(4, "Frozen Pizza", 4.99));
        assert!(products.windows(2).all(|w| w[0].price >= w[1].price));

        // 2. Create
        let (status, body) = client
            .create(&Product::new(5, "Cherries", 6.5))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Cherries");

        // 3. Read back
        let (status, body) = client.get(5).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 6.5);

        // 4. Update in place
        let (status, _) = client
            .update(&Product::new(3, "Bananas!", 2.5))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        let products = client.list().await.unwrap();
        assert_eq!(products.len(), 5);
        assert!(products.contains(&Product::new(3, "Bananas!", 2.5)));

        // 5. Update of a missing id is rejected by this backend
        let (status, _) = client
            .update(&Product::new(99, "Ghost", 1.0))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        // 6. Delete, then delete again
        let (status, body) = client.delete(5).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "success");
        let (status, body) = client.delete(5).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Product <5> does not exist");

        assert_eq!(client.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    #[ignore = "requires a built catalog-server binary"]
    async fn test_sqlite_survives_restart_without_reseeding() {
        let data_dir = TempDir::new().unwrap();
        let database = data_dir.path().join("catalog.db");

        {
            let server = TestServer::start_sqlite(next_port(), &database).await.unwrap();
            let client = server.client();

            assert_eq!(client.list().await.unwrap().len(), 4);

            let (status, _) = client.delete(1).await.unwrap();
            assert_eq!(status, StatusCode::OK);

            // Update of a missing id creates it on this backend
            let (status, _) = client
                .update(&Product::new(20, "Saffron", 12.0))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::OK);
        }

        let server = TestServer::start_sqlite(next_port(), &database).await.unwrap();
        let client = server.client();

        let products = client.list().await.unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products[0], Product::new(20, "Saffron", 12.0));
        assert!(!products.iter().any(|p| p.id == 1));

        let (status, _) = client.get(1).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires a built catalog-server binary"]
    async fn test_startup_failure_exits_non_zero() {
        let data_dir = TempDir::new().unwrap();
        let server_binary = find_server_binary().unwrap();

        let mut process = Command::new(&server_binary)
            .arg("--backend")
            .arg("sqlite")
            .arg("--database")
            .arg(data_dir.path().join("catalog.db"))
            .arg("--table")
            .arg("not a table")
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", next_port()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let status = wait_for_exit(&mut process, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!status.success());
    }
}
