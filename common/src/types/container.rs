//! Identifies a container whose stats are sampled

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// The path, relative to the docker graph directory, under which the native
/// exec driver keeps per-container state
pub const DOCKER_EXEC_DRIVER_PATH: &str = "execdriver/native";

/// A type alias for the docker-assigned container identifier
pub type ContainerId = String;

/// A handle on a container, used by a stats supplier to locate its state
///
/// The handle is opaque to the sampler, which only forwards it to the supplier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerHandle {
    /// The docker ID of the container
    pub docker_id: ContainerId,
    /// The path to the container's exec driver state
    pub state_path: PathBuf,
}

impl ContainerHandle {
    /// Build a handle for the given container, resolving its state path
    /// beneath the docker graph directory
    pub fn new<S: Into<ContainerId>, P: AsRef<Path>>(docker_id: S, docker_graph_path: P) -> Self {
        let docker_id = docker_id.into();
        let state_path =
            docker_graph_path.as_ref().join(DOCKER_EXEC_DRIVER_PATH).join(&docker_id);

        Self { docker_id, state_path }
    }
}

impl Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.docker_id)
    }
}
