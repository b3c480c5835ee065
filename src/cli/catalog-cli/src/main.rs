//! Catalog CLI - Command line interface.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Deserialize;

use catalog_storage::{Product, ProductId};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog CLI - Browse and edit the product catalog")]
#[command(version)]
struct Cli {
    /// Catalog server address
    #[arg(long, default_value = "http://localhost:8000", env = "CATALOG_ADDR")]
    addr: String,

    /// Print raw JSON instead of a table
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products, most expensive first
    List,
    /// Show one product
    Get {
        /// Product id
        id: ProductId,
    },
    /// Create a product
    Create {
        /// Product id
        #[arg(long)]
        id: ProductId,
        /// Product name
        #[arg(long)]
        name: String,
        /// Unit price
        #[arg(long)]
        price: f64,
    },
    /// Change the name and price of a product
    Update {
        /// Product id
        id: ProductId,
        /// New name
        #[arg(long)]
        name: String,
        /// New price
        #[arg(long)]
        price: f64,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: ProductId,
    },
    /// Check server status
    Status,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    backend: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx response into an error carrying the server message.
    async fn check(resp: Response, action: &str) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let error: ErrorResponse = resp.json().await.unwrap_or(ErrorResponse {
            error: "Unknown error".into(),
        });
        bail!("{} failed ({}): {}", action, status, error.error)
    }

    async fn health(&self) -> Result<HealthResponse> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = Self::check(resp, "Status").await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let resp = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = Self::check(resp, "List products").await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn get(&self, id: ProductId) -> Result<Product> {
        let resp = self
            .client
            .get(self.url(&format!("/product/{}", id)))
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = Self::check(resp, "Get product").await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn create(&self, product: &Product) -> Result<Product> {
        let resp = self
            .client
            .post(self.url("/product"))
            .json(product)
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = Self::check(resp, "Create product").await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let resp = self
            .client
            .put(self.url(&format!("/product/{}", product.id)))
            .json(product)
            .send()
            .await
            .context("Failed to connect to server")?;

        let resp = Self::check(resp, "Update product").await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn delete(&self, id: ProductId) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/product/{}", id)))
            .send()
            .await
            .context("Failed to connect to server")?;

        Self::check(resp, "Delete product").await?;
        Ok(())
    }
}

// ============================================================================
// Command Handlers
// ============================================================================

fn print_products(products: &[Product], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products found");
        return Ok(());
    }

    println!("{:>6}  {:<30}  {:>10}", "ID", "NAME", "PRICE");
    for p in products {
        println!("{:>6}  {:<30}  {:>10.2}", p.id, p.name, p.price);
    }

    Ok(())
}

async fn cmd_status(client: &CatalogClient) -> Result<()> {
    let health = client.health().await?;

    println!("Catalog server status:");
    println!("  Status:  {}", health.status);
    println!("  Backend: {}", health.backend);
    println!("  Version: {}", health.version);

    Ok(())
}

async fn cmd_list(client: &CatalogClient, json: bool) -> Result<()> {
    let products = client.list().await?;
    print_products(&products, json)
}

async fn cmd_get(client: &CatalogClient, id: ProductId, json: bool) -> Result<()> {
    let product = client.get(id).await?;
    print_products(std::slice::from_ref(&product), json)
}

async fn cmd_create(client: &CatalogClient, product: Product) -> Result<()> {
    let created = client.create(&product).await?;
    println!("Created {}", created);
    Ok(())
}

async fn cmd_update(client: &CatalogClient, product: Product) -> Result<()> {
    let updated = client.update(&product).await?;
    println!("Updated {}", updated);
    Ok(())
}

async fn cmd_delete(client: &CatalogClient, id: ProductId) -> Result<()> {
    client.delete(id).await?;
    println!("Product {} deleted", id);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = CatalogClient::new(&cli.addr)?;

    match cli.command {
        Commands::Status => cmd_status(&client).await,
        Commands::List => cmd_list(&client, cli.json).await,
        Commands::Get { id } => cmd_get(&client, id, cli.json).await,
        Commands::Create { id, name, price } => {
            cmd_create(&client, Product::new(id, name, price)).await
        },
        Commands::Update { id, name, price } => {
            cmd_update(&client, Product::new(id, name, price)).await
        },
        Commands::Delete { id } => cmd_delete(&client, id).await,
    }
}
