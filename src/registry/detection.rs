// ABOUTME: Local container engine detection for the engine backend.
// ABOUTME: Checks Podman sockets first, then Docker, unless a socket is configured.

use serde::{Deserialize, Serialize};
use std::path::Path;

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// The container engine type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Docker,
    Podman,
}

impl std::fmt::Display for EngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineType::Docker => write!(f, "docker"),
            EngineType::Podman => write!(f, "podman"),
        }
    }
}

/// Detected engine socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub engine_type: EngineType,
    pub socket_path: String,
}

/// Explicit engine override from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: Option<EngineType>,
    #[serde(default)]
    pub socket: Option<String>,
}

/// Error during engine detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container engine found (checked Podman and Docker sockets)")]
    NoEngineFound,
}

/// Resolve the engine socket to connect to.
///
/// An explicit engine type in `config` wins. Otherwise the order is:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_engine(config: &EngineConfig) -> Result<EngineInfo, DetectionError> {
    if let Some(engine_type) = config.engine {
        let socket_path = config
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(engine_type));
        return Ok(EngineInfo {
            engine_type,
            socket_path,
        });
    }

    if let Some(ref socket) = config.socket {
        // A bare socket path without a type: Podman sockets carry the name
        let engine_type = if socket.contains("podman") {
            EngineType::Podman
        } else {
            EngineType::Docker
        };
        return Ok(EngineInfo {
            engine_type,
            socket_path: socket.clone(),
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(EngineInfo {
                engine_type: EngineType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(EngineInfo {
            engine_type: EngineType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(EngineInfo {
            engine_type: EngineType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoEngineFound)
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(engine: EngineType) -> String {
    match engine {
        EngineType::Docker => DOCKER_SOCKET.to_string(),
        EngineType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}
