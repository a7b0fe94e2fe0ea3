// ABOUTME: Repos command implementation.
// ABOUTME: Lists every repository of the configured backend with its image count.

use super::backend::connect_backend;
use regprune::config::BackendSettings;
use regprune::error::Result;
use regprune::output::Output;
use regprune::registry::Inventory;

pub async fn list_repositories(settings: BackendSettings, output: Output) -> Result<()> {
    let registry = connect_backend(&settings, &output).await?;

    for repository in registry.list_repositories().await? {
        let images = registry.list_images(&repository).await?;
        output.repository_entry(&repository, images.len());
    }
    Ok(())
}
