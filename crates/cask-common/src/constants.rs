//! System-wide constants and default paths.

/// Application name; also the cgroup subtree owned by the runtime.
pub const APP_NAME: &str = "cask";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "cask";

/// Image store directory, relative to the data directory.
pub const IMAGES_DIR: &str = "images";

/// Container state directory, relative to the data directory.
pub const CONTAINERS_DIR: &str = "containers";

/// Root of the host cgroup hierarchy.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Hostname assigned inside the container's UTS namespace.
pub const CONTAINER_HOSTNAME: &str = "cask-container";

/// Path of the self-inserted runtime binary inside the container rootfs.
pub const CONTAINER_BIN_PATH: &str = "/usr/local/bin/cask";

/// Environment variable carrying the container rootfs path (informational).
pub const ROOTFS_ENV: &str = "CASK_ROOTFS";

/// Default buildfile name looked up in the build context.
pub const DEFAULT_BUILDFILE: &str = "Caskfile";

/// Legacy buildfile name accepted when no `Caskfile` exists.
pub const LEGACY_BUILDFILE: &str = "Dockerfile";

/// Command run when the user supplies none.
pub const DEFAULT_COMMAND: &str = "/bin/sh";

/// `PATH` value exported to the containerized process.
pub const CONTAINER_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";
