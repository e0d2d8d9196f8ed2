//! Parley - A terminal client for the social chat backend
//!
//! This is the main entry point for the Parley chat application.

use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use social::{ApiClient, Conversation, ServerConfig, SessionContext, UserId};
use std::sync::Arc;

mod app;
mod input;

use app::ParleyApp;

/// Bearer token to use instead of logging in (`PARLEY_TOKEN`)
const ENV_TOKEN: &str = "TOKEN";
const ENV_USERNAME: &str = "USERNAME";
const ENV_PASSWORD: &str = "PASSWORD";

const USAGE: &str = "Usage: parley [--dm <user id>]";

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let conversation = match parse_args(std::env::args().skip(1)) {
        Ok(Some(conversation)) => conversation,
        Ok(None) => {
            println!("{}", USAGE);
            return;
        }
        Err(e) => {
            eprintln!("{:#}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(conversation).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(conversation: Conversation) -> Result<()> {
    let server = match ServerConfig::load() {
        Ok(server) => {
            if !ServerConfig::exists() {
                match ServerConfig::default().save() {
                    Ok(path) => info!("Wrote default settings to {}", path.display()),
                    Err(e) => warn!("Could not write default settings: {:#}", e),
                }
            }
            server
        }
        Err(e) => {
            warn!("Using default server settings: {:#}", e);
            if let Some(path) = ServerConfig::default_config_path() {
                warn!("Settings are read from {}", path.display());
            }
            ServerConfig::default()
        }
    };
    info!("Backend: {}", server.base_url);

    let api = Arc::new(server.api_client()?);

    let login_api = api.clone();
    let token = tokio::task::spawn_blocking(move || obtain_token(&login_api)).await??;

    let session = Arc::new(SessionContext::new());
    session
        .login(&token)
        .context("Server issued an unusable token")?;

    let app = ParleyApp::new(api, session, server.sync_options(conversation))?;
    app.run().await
}

/// Use `PARLEY_TOKEN` if set, otherwise log in with username and password
fn obtain_token(api: &ApiClient) -> Result<String> {
    if let Some(token) = config::env_var(ENV_TOKEN) {
        return Ok(token.trim().to_string());
    }

    match (config::env_var(ENV_USERNAME), config::env_var(ENV_PASSWORD)) {
        (Some(username), Some(password)) => {
            let username = username.trim();
            info!("Logging in as {}", username);
            api.login(username, &password).context("Login failed")
        }
        _ => bail!(
            "No credentials: set {} or both {} and {}",
            config::env_key(ENV_TOKEN),
            config::env_key(ENV_USERNAME),
            config::env_key(ENV_PASSWORD)
        ),
    }
}

/// Parse arguments; `Ok(None)` means help was requested
fn parse_args<I>(args: I) -> Result<Option<Conversation>>
where
    I: IntoIterator<Item = String>,
{
    let mut conversation = Conversation::Room;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dm" => {
                let peer = args.next().context("--dm needs a user id")?;
                conversation = Conversation::Direct {
                    peer: UserId::parse(&peer)?,
                };
            }
            "-h" | "--help" => return Ok(None),
            other => bail!("Unexpected argument: {}", other),
        }
    }
    Ok(Some(conversation))
}
