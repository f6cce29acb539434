//! Parley CLI - Lightweight room chat client
//!
//! A terminal-based client for Parley chat servers.

mod api;
mod config;
mod error;
mod models;
mod room;
mod socket;
mod tui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::ApiClient;
use config::Config;
use room::compose::Attachment;
use room::conversation::{ConversationView, RenderItem};
use room::OutboundComposer;

#[derive(Parser)]
#[command(name = "parley-cli")]
#[command(about = "Lightweight CLI client for Parley room chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Server base URL (overrides the saved config)
    #[arg(short, long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the local identity with the server and save it
    Profile {
        /// Stable user id (used for dedup and presence)
        user_id: String,

        /// Display name shown to other room members
        username: String,

        /// Path to an avatar image
        #[arg(short, long)]
        avatar: Option<PathBuf>,
    },

    /// Create a room
    CreateRoom {
        /// Room id: exactly 5 digits
        room: String,

        /// Room password (min 8 characters)
        password: String,
    },

    /// Print a room's message history
    History {
        /// Room id
        room: String,

        /// Room password, if this client did not create the room
        #[arg(short, long)]
        password: Option<String>,

        /// Maximum number of messages to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Send a single message without opening the chat view
    Send {
        /// Room id
        room: String,

        /// Message text (may be empty when sending a file)
        #[arg(default_value = "")]
        message: String,

        /// Path to a file to attach
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Open the interactive chat view for a room
    Chat {
        /// Room id
        room: String,

        /// Room password, if this client did not create the room
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::load()?;
    let server = config.server_url(cli.server.as_deref());
    let client = ApiClient::new(&server);

    match cli.command {
        Commands::Profile {
            user_id,
            username,
            avatar,
        } => {
            let avatar_url = avatar.as_deref().map(encode_data_url).transpose()?;
            api::create_profile(&client, &user_id, &username, avatar_url.as_deref()).await?;

            config.user_id = Some(user_id);
            config.username = Some(username);
            config.avatar = avatar_url;
            if cli.server.is_some() {
                config.server_url = Some(server);
            }
            config.save()?;
            println!("Profile saved.");
        }
        Commands::CreateRoom { room, password } => {
            api::create_room(&client, &room, &password).await?;
            println!("Room {room} created.");
        }
        Commands::History {
            room,
            password,
            limit,
        } => {
            let (user_id, _) = config.identity()?;
            print_history(&client, &room, &user_id, password.as_deref(), limit).await?;
        }
        Commands::Send {
            room,
            message,
            file,
        } => {
            let (user_id, _) = config.identity()?;
            send_once(&client, &room, &user_id, &message, file.as_deref()).await?;
        }
        Commands::Chat { room, password } => {
            let (user_id, username) = config.identity()?;
            tui::run(&client, &room, &user_id, &username, password.as_deref()).await?;
        }
    }

    Ok(())
}

/// Fetch and print history to stdout, in conversation order with date
/// separators.
async fn print_history(
    client: &ApiClient,
    room: &str,
    user_id: &str,
    password: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let mut wire = api::fetch_history(client, room, user_id, password).await?;
    if let Some(limit) = limit {
        let skip = wire.len().saturating_sub(limit);
        wire.drain(..skip);
    }

    let mut view = ConversationView::new();
    view.load_history(
        wire.into_iter()
            .map(|w| models::Message::from_wire(w, user_id))
            .collect(),
    );

    for item in view.snapshot() {
        match item {
            RenderItem::DateSeparator(date) => println!("--- {date} ---"),
            RenderItem::Message(msg) => {
                let body = if msg.deleted {
                    "This message was deleted".to_string()
                } else {
                    msg.text.clone().unwrap_or_default()
                };
                println!("{} {}: {}", msg.time, msg.sender_name, body);
                if let Some(ref media) = msg.media {
                    if !msg.deleted {
                        println!("    [attachment: {}]", media.name);
                    }
                }
            }
        }
    }
    Ok(())
}

/// One-shot send: join the room on the live channel, emit, withdraw.
async fn send_once(
    client: &ApiClient,
    room: &str,
    user_id: &str,
    message: &str,
    file: Option<&Path>,
) -> Result<()> {
    let attachment = file.map(read_attachment).transpose()?;

    let composer = OutboundComposer::new(room, user_id);
    let Some(envelope) = composer.compose(message, attachment)? else {
        anyhow::bail!("Nothing to send: empty message and no file");
    };

    let mut chat = socket::ChatSocket::connect(client.http(), client.base_url()).await?;
    chat.join(room, user_id).await?;
    chat.send_message(&envelope).await?;
    chat.leave(room, user_id).await?;

    println!("Sent.");
    Ok(())
}

/// Read a file into an attachment, typed by extension.
fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(Attachment {
        bytes,
        name,
        media_type: guess_media_type(path).to_string(),
    })
}

/// Encode a file as a data URL (avatar upload).
fn encode_data_url(path: &Path) -> Result<String> {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let att = read_attachment(path)?;
    if att.bytes.len() > room::compose::MAX_ATTACHMENT_BYTES {
        anyhow::bail!("{} is over the 5 MiB limit", path.display());
    }
    Ok(format!(
        "data:{};base64,{}",
        att.media_type,
        BASE64.encode(&att.bytes)
    ))
}

/// Media type by file extension. The server only distinguishes image/*,
/// video/* and "other", so unknown types fall back to a generic binary.
fn guess_media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
