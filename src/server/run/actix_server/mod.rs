//! Run the server.

use std::sync::Arc;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use utoipa::OpenApi as _;

use crate::analysis::AnalysisConfig;
use crate::scoring::{host::HostConfig, LikelihoodScorer};
use crate::sequence::SequenceSource;

pub mod seqvars_analyse;
pub mod versions;

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct CustomError {
    err: String,
    #[serde(skip)]
    status: u16,
}

impl std::fmt::Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.err)
    }
}

impl CustomError {
    fn new(err: anyhow::Error) -> Self {
        CustomError {
            err: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

impl From<crate::Error> for CustomError {
    fn from(err: crate::Error) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        CustomError {
            err: err.to_string(),
            status: status.as_u16(),
        }
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Data structure for the web server data.
#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct WebServerData {
    /// Where reference windows are fetched from.
    #[derivative(Debug = "ignore")]
    pub source: Arc<dyn SequenceSource>,
    /// The loaded model.
    #[derivative(Debug = "ignore")]
    pub scorer: Arc<dyn LikelihoodScorer>,
    /// Window size and calibration used for every request.
    pub config: AnalysisConfig,
    /// Deployment settings of the model host.
    pub host: HostConfig,
}

/// Main entry point for running the REST server.
#[actix_web::main]
pub async fn main(
    args: &super::Args,
    data: actix_web::web::Data<WebServerData>,
) -> std::io::Result<()> {
    let mut server = actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(data.clone())
            .service(seqvars_analyse::handle)
            .service(seqvars_analyse::handle_with_openapi)
            .service(versions::handle)
            .service(
                utoipa_swagger_ui::SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", super::openapi::ApiDoc::openapi()),
            )
            .wrap(actix_web::middleware::Logger::default())
    });
    if let Some(workers) = args.workers {
        server = server.workers(workers);
    }
    server
        .bind((args.listen_host.as_str(), args.listen_port))?
        .run()
        .await
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use actix_web::web::Data;

    use super::*;
    use crate::scoring::test::WeightScorer;
    use crate::sequence::test::InMemorySource;

    /// Server data over a synthetic chromosome and the weight scorer.
    pub(crate) fn data(weights: [f64; 4]) -> Data<WebServerData> {
        Data::new(WebServerData {
            source: Arc::new(InMemorySource::new("ACGT".repeat(5_000))),
            scorer: Arc::new(WeightScorer::new(weights)),
            config: AnalysisConfig::default(),
            host: HostConfig::default(),
        })
    }

    #[test]
    fn custom_error_status() {
        let err = CustomError::from(crate::Error::InvalidBase("N".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = CustomError::from(crate::Error::Service { status: 503 });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = CustomError::new(anyhow::anyhow!("boom"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "\"boom\"");
    }
}
