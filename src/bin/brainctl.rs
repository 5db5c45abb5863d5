//! brainctl - command-line client for the Second Brain API
//!
//! Lists, counts, creates and deletes content through the same cache and
//! invalidation path the dashboard views use.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use second_brain_sdk::{
    ApiClient, ClientConfig, ContentCache, ContentItem, ContentKind, ContentMutations,
    ContentView, DocumentUpload, InvalidationSignal, KindFilter,
};

/// Command-line client for the Second Brain API
#[derive(Parser, Debug)]
#[command(name = "brainctl")]
#[command(about = "Browse and manage Second Brain notes, documents and links")]
struct Args {
    /// Backend base URL
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:3000")]
    backend_url: String,

    /// User whose content to act on (defaults to the logged-in user)
    #[arg(long, env = "USER_ID")]
    user_id: Option<String>,

    /// Bearer token for authenticated access
    #[arg(long, env = "API_TOKEN")]
    api_token: Option<String>,

    /// Session cookie (name=value) for authenticated access
    #[arg(long, env = "SESSION_COOKIE")]
    session_cookie: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List content, optionally filtered by kind (ALL, NOTE, DOCUMENT, LINK)
    List {
        #[arg(long, default_value = "ALL")]
        kind: String,
    },
    /// Show item counts per kind
    Counts,
    /// Create a note
    Note {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Upload a document
    Upload {
        path: PathBuf,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Delete a content item
    Delete { id: String },
    /// Show the logged-in user
    Whoami,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.backend_url).with_timeout_secs(self.timeout_secs);
        if let Some(token) = &self.api_token {
            config = config.with_api_token(token);
        }
        if let Some(cookie) = &self.session_cookie {
            config = config.with_session_cookie(cookie);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("brainctl={0},second_brain_sdk={0}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = Arc::new(ApiClient::new(args.client_config()).context("invalid configuration")?);

    if let Command::Whoami = args.command {
        match client.current_user().await? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("not logged in"),
        }
        return Ok(());
    }

    let user_id = match args.user_id.clone() {
        Some(id) => id,
        None => match client.current_user().await? {
            Some(user) => user.id,
            None => bail!("not logged in; pass --user-id or a session"),
        },
    };

    let signal = InvalidationSignal::global();
    let cache = Arc::new(ContentCache::new(client.clone()));
    let view = ContentView::new(cache.clone(), signal.clone(), Some(user_id.clone()));
    view.activate().await;
    if let Some(err) = cache.error() {
        bail!("{}", err);
    }

    let mutations = ContentMutations::new(client, signal);
    let before = cache.count_by_kind(&KindFilter::All);

    match args.command {
        Command::List { kind } => {
            cache.filter_by_name(&kind);
            let items = cache.filtered();
            if items.is_empty() {
                println!("no content");
            }
            for item in &items {
                print_item(item);
            }
            return Ok(());
        }
        Command::Counts => {
            println!("{:<9} {}", "ALL", before);
            for kind in ContentKind::KNOWN {
                let count = cache.count_by_kind(&KindFilter::Kind(kind.clone()));
                println!("{:<9} {}", kind, count);
            }
            return Ok(());
        }
        Command::Note { title, content } => {
            mutations.create_note(title, content, user_id).await?;
        }
        Command::Upload { path, mime } => {
            let upload = read_upload(&path, mime, user_id)?;
            mutations.upload_document(upload).await?;
        }
        Command::Delete { id } => {
            mutations.delete(&id).await?;
        }
        Command::Whoami => return Ok(()),
    }

    if !view.refresh_if_dirty().await {
        warn!("Mutation did not invalidate content");
    }
    if let Some(err) = cache.error() {
        bail!("refresh failed: {}", err);
    }

    let after = cache.count_by_kind(&KindFilter::All);
    info!(before, after, "Content refreshed");
    println!("items: {} -> {}", before, after);
    view.deactivate();

    Ok(())
}

fn print_item(item: &ContentItem) {
    let extra = match (&item.kind, item.resource_url.as_deref()) {
        (ContentKind::Link, Some(url)) if item.is_tweet() => format!("  tweet {}", url),
        (_, Some(url)) => format!("  {}", url),
        _ => String::new(),
    };
    println!(
        "[{:<8}] {}  {}  {}{}",
        item.kind,
        item.id,
        item.display_title(),
        item.created_at.format("%Y-%m-%d"),
        extra
    );
}

fn read_upload(path: &Path, mime: Option<String>, user_id: String) -> anyhow::Result<DocumentUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("path has no file name")?
        .to_string();
    let mime = mime.unwrap_or_else(|| guess_mime(&file_name).to_string());
    Ok(DocumentUpload::new(file_name, mime, bytes, user_id))
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
