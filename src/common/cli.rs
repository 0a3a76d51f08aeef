use std::time::Duration;

use clap::Args as ClapArgs;

use crate::scoring::host::{
    HostConfig, DEFAULT_APP_NAME, DEFAULT_BASE_IMAGE, DEFAULT_CACHE_MOUNT_PATH,
    DEFAULT_CACHE_VOLUME, DEFAULT_GPU,
};
use crate::scoring::{ScorerConfig, DEFAULT_MODEL};
use crate::sequence::ucsc::{UcscConfig, DEFAULT_BASE_URL};

/// Settings for the Evo2 model host.
#[derive(Debug, Clone, ClapArgs)]
pub struct ScorerArgs {
    /// Base URL of the model host.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub model_endpoint: String,

    /// Evo2 checkpoint to load.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximal number of sequences per scoring request.
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 1000)]
    pub model_timeout: u64,
}

impl ScorerArgs {
    pub fn to_config(&self) -> ScorerConfig {
        ScorerConfig {
            endpoint: self.model_endpoint.clone(),
            model: self.model.clone(),
            batch_size: self.batch_size,
            timeout: Duration::from_secs(self.model_timeout),
        }
    }
}

/// Settings for the UCSC sequence API.
#[derive(Debug, Clone, ClapArgs)]
pub struct UcscArgs {
    /// Base URL of the UCSC REST API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub ucsc_base_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub ucsc_timeout: u64,
}

impl UcscArgs {
    pub fn to_config(&self) -> UcscConfig {
        UcscConfig {
            base_url: self.ucsc_base_url.clone(),
            timeout: Duration::from_secs(self.ucsc_timeout),
        }
    }
}

/// Deployment settings of the model host, reported by the server.
#[derive(Debug, Clone, ClapArgs)]
pub struct HostArgs {
    /// Application name on the GPU platform.
    #[arg(long, default_value = DEFAULT_APP_NAME)]
    pub host_app_name: String,

    /// Container image of the model host.
    #[arg(long, default_value = DEFAULT_BASE_IMAGE)]
    pub host_base_image: String,

    /// GPU type per container.
    #[arg(long, default_value = DEFAULT_GPU)]
    pub host_gpu: String,

    /// Upper bound of concurrently running containers.
    #[arg(long, default_value_t = 3)]
    pub host_max_containers: u32,

    /// Retries of a failed request on the host.
    #[arg(long, default_value_t = 2)]
    pub host_retries: u32,

    /// Seconds an idle container is kept.
    #[arg(long, default_value_t = 60)]
    pub host_scaledown_window: u64,

    /// Name of the model weight cache volume.
    #[arg(long, default_value = DEFAULT_CACHE_VOLUME)]
    pub host_cache_volume: String,

    /// Mount point of the cache volume.
    #[arg(long, default_value = DEFAULT_CACHE_MOUNT_PATH)]
    pub host_cache_mount_path: String,

    /// Time limit in seconds of a calibration run.
    #[arg(long, default_value_t = 1000)]
    pub host_batch_timeout: u64,
}

impl HostArgs {
    pub fn to_config(&self) -> HostConfig {
        HostConfig {
            app_name: self.host_app_name.clone(),
            base_image: self.host_base_image.clone(),
            gpu: self.host_gpu.clone(),
            max_containers: self.host_max_containers,
            retries: self.host_retries,
            scaledown_window_secs: self.host_scaledown_window,
            cache_volume: self.host_cache_volume.clone(),
            cache_mount_path: self.host_cache_mount_path.clone(),
            batch_timeout_secs: self.host_batch_timeout,
        }
    }
}
