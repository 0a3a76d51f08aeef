use actix_web::{
    get,
    web::{Data, Json},
};

use crate::classify::CalibrationParameters;
use crate::scoring::host::HostConfig;

use super::CustomError;

/// Software version specification.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct SoftwareVersions {
    /// Version of `vareon`.
    pub vareon: String,
}

impl SoftwareVersions {
    /// Create a new `SoftwareVersions` instance.
    pub fn new() -> Self {
        Self {
            vareon: crate::built_info::PKG_VERSION.to_string(),
        }
    }
}

impl Default for SoftwareVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// Model and classification settings of the running server.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct ModelInfo {
    /// Name of the Evo2 checkpoint.
    pub model: String,
    /// Number of bases around the variant.
    pub window_size: u64,
    /// Threshold and class spreads.
    pub calibration: CalibrationParameters,
    /// Deployment settings of the model host.
    pub host: HostConfig,
}

/// Response of the `/api/v1/versionsInfo` endpoint.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct VersionsInfoResponse {
    /// Software versions specification.
    pub software: SoftwareVersions,
    /// Model specification.
    pub model: ModelInfo,
}

impl VersionsInfoResponse {
    /// Create a new `VersionsInfoResponse` instance from the given `WebServerData`.
    pub fn from_web_server_data(data: &super::WebServerData) -> Self {
        Self {
            software: SoftwareVersions::new(),
            model: ModelInfo {
                model: data.scorer.model_name().to_string(),
                window_size: data.config.window_size,
                calibration: data.config.calibration,
                host: data.host.clone(),
            },
        }
    }
}

/// Query for version information.
#[allow(clippy::unused_async)]
#[utoipa::path(
    get,
    operation_id = "versionsInfo",
    responses(
        (status = 200, description = "Version information.", body = VersionsInfoResponse),
        (status = 500, description = "Internal server error.", body = CustomError)
    )
)]
#[get("/api/v1/versionsInfo")]
async fn handle(
    data: Data<super::WebServerData>,
) -> actix_web::Result<Json<VersionsInfoResponse>, CustomError> {
    Ok(Json(VersionsInfoResponse::from_web_server_data(
        data.into_inner().as_ref(),
    )))
}
