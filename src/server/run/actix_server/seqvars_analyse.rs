//! Implementation of endpoint `/api/v1/seqvars/analyse`.
//!
//! Also includes the implementation of the `/analyseSingleMutation` endpoint (deprecated).

use actix_web::{
    post,
    web::{self, Data, Json},
};

use crate::analysis::{analyse_single_mutation, VariantAnalysis, VariantRequest};

use super::CustomError;

/// Implementation of endpoints.
async fn handle_impl(
    data: Data<super::WebServerData>,
    body: Json<VariantRequest>,
) -> actix_web::Result<Json<VariantAnalysis>, CustomError> {
    let request = body.into_inner();

    // Sequence fetch and scoring block on network I/O.
    let result = web::block(move || {
        analyse_single_mutation(
            data.source.as_ref(),
            data.scorer.as_ref(),
            &data.config,
            &request,
        )
    })
    .await
    .map_err(|e| CustomError::new(anyhow::anyhow!("analysis task failed: {}", e)))?
    .map_err(|e| {
        tracing::warn!("analysis failed: {}", &e);
        CustomError::from(e)
    })?;

    Ok(Json(result))
}

/// Analyse a single SNV.
#[allow(clippy::unused_async)]
#[post("/analyseSingleMutation")]
async fn handle(
    data: Data<super::WebServerData>,
    body: Json<VariantRequest>,
) -> actix_web::Result<Json<VariantAnalysis>, CustomError> {
    handle_impl(data, body).await
}

/// Analyse a single SNV.
#[allow(clippy::unused_async)]
#[utoipa::path(
    post,
    operation_id = "seqvarsAnalyse",
    request_body = VariantRequest,
    responses(
        (status = 200, description = "Pathogenicity prediction.", body = VariantAnalysis),
        (status = 400, description = "Invalid variant.", body = CustomError),
        (status = 500, description = "Internal server error.", body = CustomError)
    )
)]
#[post("/api/v1/seqvars/analyse")]
async fn handle_with_openapi(
    data: Data<super::WebServerData>,
    body: Json<VariantRequest>,
) -> actix_web::Result<Json<VariantAnalysis>, CustomError> {
    handle_impl(data, body).await
}
