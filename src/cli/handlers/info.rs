//! Information and maintenance handlers (stats, reset, config)

use crate::cli::output::*;
use crate::rag::ChatService;
use crate::AppConfig;
use crate::Result;

pub async fn handle_stats_command(config: &AppConfig) -> Result<()> {
    let service = ChatService::from_config(config).await?;
    print_collection_stats(&service.index().collection_stats().await);
    Ok(())
}

pub async fn handle_reset_command(config: &AppConfig, force: bool) -> Result<()> {
    if !force {
        print_warning(&format!(
            "This will delete every chunk in collection '{}'.",
            config.vector_store.collection_name
        ));
        println!("\nUse --force to proceed.");
        return Ok(());
    }

    let service = ChatService::from_config(config).await?;
    service.index().reset_collection().await?;
    print_success("Collection cleared");
    Ok(())
}

pub fn handle_config_command(config: &AppConfig) {
    print_config(config);
}
