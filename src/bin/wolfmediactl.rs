//! WolfMediaCtl - Command line client for a WolfMedia gateway
//!
//! Usage:
//!   wolfmediactl upload photo.jpg --category events --folder promo
//!   wolfmediactl list --category events
//!   wolfmediactl mkdir events promo
//!   wolfmediactl rm events/promo/1700000000000-photo.jpg

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;

/// WolfMedia Gateway Control Tool
#[derive(Parser)]
#[command(name = "wolfmediactl")]
#[command(about = "Upload, list and delete media through a WolfMedia gateway", long_about = None)]
struct Cli {
    /// Gateway endpoint
    #[arg(short, long, env = "WOLFMEDIA_ENDPOINT", default_value = "http://127.0.0.1:8787")]
    endpoint: String,

    /// Shared API key
    #[arg(short = 'k', long, env = "WOLFMEDIA_API_KEY", hide_env_values = true)]
    api_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo or video
    Upload {
        /// File to upload
        file: PathBuf,
        /// Category (events, team, general)
        #[arg(short, long)]
        category: Option<String>,
        /// Folder inside the category
        #[arg(short, long)]
        folder: Option<String>,
        /// Content type (inferred from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List files and folders
    List {
        /// Category to list (whole bucket when omitted)
        #[arg(short, long)]
        category: Option<String>,
        /// Folder inside the category
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Create an empty folder
    Mkdir {
        category: String,
        folder: String,
    },
    /// Delete an object by key
    Rm {
        key: String,
    },
}

// ============ API Response Types ============

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    key: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<FileSummary>,
    #[serde(default)]
    folders: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileSummary {
    key: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    uploaded: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============ Main ============

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = Client::new(&cli.endpoint, &cli.api_key);

    let result = match cli.command {
        Commands::Upload { file, category, folder, content_type } => {
            upload(&client, &file, category, folder, content_type).await
        }
        Commands::List { category, folder } => list(&client, category, folder).await,
        Commands::Mkdir { category, folder } => mkdir(&client, &category, &folder).await,
        Commands::Rm { key } => remove(&client, &key).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Authenticated gateway client
struct Client {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Client {
    fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.endpoint, path))
            .bearer_auth(&self.api_key)
    }

    /// Send a request and decode the JSON body, surfacing `{error}` replies
    async fn send<T: for<'de> Deserialize<'de>>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.context("gateway unreachable")?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "no error message".to_string());
            bail!("API error {}: {}", status, message);
        }

        Ok(response.json().await?)
    }
}

// ============ Commands ============

async fn upload(
    client: &Client,
    path: &Path,
    category: Option<String>,
    folder: Option<String>,
    content_type: Option<String>,
) -> Result<()> {
    let content_type = match content_type.or_else(|| guess_content_type(path).map(str::to_string)) {
        Some(ct) => ct,
        None => bail!("cannot infer content type of {}; pass --content-type", path.display()),
    };
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let part = reqwest::multipart::Part::bytes(data)
        .file_name(filename)
        .mime_str(&content_type)?;
    let mut form = reqwest::multipart::Form::new().part("file", part);
    if let Some(category) = category {
        form = form.text("category", category);
    }
    if let Some(folder) = folder {
        form = form.text("folder", folder);
    }

    let uploaded: UploadResponse = client
        .send(client.request(reqwest::Method::POST, "/upload").multipart(form))
        .await?;

    println!("Uploaded {} ({} bytes)", uploaded.key, uploaded.size);
    println!("{}", uploaded.url);
    Ok(())
}

async fn list(client: &Client, category: Option<String>, folder: Option<String>) -> Result<()> {
    let mut query = Vec::new();
    if let Some(category) = category {
        query.push(("category", category));
    }
    if let Some(folder) = folder {
        query.push(("folder", folder));
    }

    let listing: ListResponse = client
        .send(client.request(reqwest::Method::GET, "/list").query(&query))
        .await?;

    for folder in &listing.folders {
        println!("{:<60} {:>12}", format!("{}/", folder), "-");
    }
    for file in &listing.files {
        println!("{:<60} {:>12}  {}", file.key, human_size(file.size), file.uploaded);
    }
    println!();
    println!("{} folders, {} files", listing.folders.len(), listing.files.len());
    Ok(())
}

async fn mkdir(client: &Client, category: &str, folder: &str) -> Result<()> {
    let _: serde_json::Value = client
        .send(
            client
                .request(reqwest::Method::POST, "/create-folder")
                .json(&json!({ "category": category, "folder": folder })),
        )
        .await?;

    println!("Created folder {}/{}", category, folder);
    Ok(())
}

async fn remove(client: &Client, key: &str) -> Result<()> {
    let _: serde_json::Value = client
        .send(
            client
                .request(reqwest::Method::DELETE, "/delete")
                .json(&json!({ "key": key })),
        )
        .await?;

    println!("Deleted {}", key);
    Ok(())
}

// ============ Helpers ============

/// Map a file extension to one of the gateway's accepted media types
fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "mov" | "qt" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(content_type)
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/Photo.JPG")), Some("image/jpeg"));
        assert_eq!(guess_content_type(Path::new("clip.mov")), Some("video/quicktime"));
        assert_eq!(guess_content_type(Path::new("doc.pdf")), None);
        assert_eq!(guess_content_type(Path::new("noext")), None);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(100 * 1024 * 1024), "100.0 MB");
    }
}
