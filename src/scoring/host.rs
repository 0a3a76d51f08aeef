//! Deployment settings of the GPU host that runs the model.
//!
//! The host is provisioned outside of this crate; the values here describe it and
//! are reported by the server so that results can be traced back to the setup.

/// Name of the application on the GPU platform.
pub const DEFAULT_APP_NAME: &str = "vareon-evo2-variant-analysis";
/// Container image the model runs in.
pub const DEFAULT_BASE_IMAGE: &str = "nvcr.io/nvidia/pytorch:25.02-py3";
/// GPU type requested per container.
pub const DEFAULT_GPU: &str = "H100";
/// Volume caching the downloaded model weights.
pub const DEFAULT_CACHE_VOLUME: &str = "hf_cache";
/// Mount point of the cache volume.
pub const DEFAULT_CACHE_MOUNT_PATH: &str = "/root/.cache/huggingface";

/// Platform configuration of the model host.
#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(default)]
pub struct HostConfig {
    /// Application name on the GPU platform.
    pub app_name: String,
    /// Container image.
    pub base_image: String,
    /// GPU type per container.
    pub gpu: String,
    /// Upper bound of concurrently running containers.
    pub max_containers: u32,
    /// Retries of a failed request on the host.
    pub retries: u32,
    /// Seconds an idle container is kept before it is scaled down.
    pub scaledown_window_secs: u64,
    /// Name of the model weight cache volume.
    pub cache_volume: String,
    /// Where the cache volume is mounted.
    pub cache_mount_path: String,
    /// Time limit in seconds of a calibration run on the host.
    pub batch_timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            gpu: DEFAULT_GPU.to_string(),
            max_containers: 3,
            retries: 2,
            scaledown_window_secs: 60,
            cache_volume: DEFAULT_CACHE_VOLUME.to_string(),
            cache_mount_path: DEFAULT_CACHE_MOUNT_PATH.to_string(),
            batch_timeout_secs: 1000,
        }
    }
}
