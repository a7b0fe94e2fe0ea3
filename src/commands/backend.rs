// ABOUTME: Shared helper for connecting to the configured registry backend.
// ABOUTME: Used by both clean and repos so they report connection progress the same way.

use regprune::config::BackendSettings;
use regprune::error::Result;
use regprune::output::Output;
use regprune::registry::{
    Backend, BackendError, BackendErrorKind, EcrRegistry, EngineRegistry, SnapshotRegistry, detect_engine,
};

/// Open the registry described by `settings`.
pub async fn connect_backend(settings: &BackendSettings, output: &Output) -> Result<Backend> {
    tracing::debug!("Connecting to {} backend", settings.kind());
    match settings {
        BackendSettings::Ecr { region } => {
            output.progress(&format!(
                "Using ECR in region: {}",
                region.as_deref().unwrap_or("(default)")
            ));
            let registry = EcrRegistry::connect(region.as_deref()).await;
            Ok(Backend::Ecr(registry))
        }
        BackendSettings::Engine(config) => {
            output.progress("Detecting container engine...");
            let info = detect_engine(config)
                .map_err(BackendError::from)
                .inspect_err(|e| {
                    if e.kind() == BackendErrorKind::NoEngineFound {
                        output.warning("set engine.socket in regprune.yml if the engine runs elsewhere");
                    }
                })?;
            output.progress(&format!(
                "Found {} at {}",
                info.engine_type, info.socket_path
            ));
            Ok(Backend::Engine(EngineRegistry::connect(&info)?))
        }
        BackendSettings::Snapshot { path } => {
            tracing::debug!("Loading snapshot {}", path.display());
            Ok(Backend::Snapshot(SnapshotRegistry::load(path)?))
        }
    }
}
