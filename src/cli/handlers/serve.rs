//! API server handlers

use crate::api::serve_api;
use crate::cli::output::*;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_command(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    // CLI arguments take priority over config
    let mut config = config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.enable_cors |= cors;

    println!("🚀 Starting askrag API Server");
    println!("=============================\n");
    println!("📍 Host: {}", config.server.host);
    println!("🔌 Port: {}", config.server.port);
    println!(
        "🌐 CORS: {}",
        if config.server.enable_cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    if !config.api_key_required() {
        print_warning("No API key configured; protected endpoints are open");
    }
    println!();

    serve_api(&config).await
}
