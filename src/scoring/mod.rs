//! Access to the Evo2 likelihood model.
//!
//! The model itself runs on an external GPU host.  [`RemoteScorer::load`] asks the
//! host to load the weights once and returns the handle that is then passed by
//! reference wherever sequences need to be scored.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{Error, Result};

pub mod host;

/// Default Evo2 checkpoint.
pub const DEFAULT_MODEL: &str = "evo2_7b";

/// A model that assigns a likelihood-like score to DNA sequences.
///
/// Lower scores mean the sequence is less likely under the model.  Scoring the same
/// sequence twice is expected to give the same score.
pub trait LikelihoodScorer: Send + Sync {
    /// Name of the model, for reporting.
    fn model_name(&self) -> &str;

    /// Score a batch of sequences, returning one score per input in input order.
    fn score_sequences(&self, sequences: &[String]) -> Result<Vec<f64>>;
}

/// Configuration of the remote model host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerConfig {
    /// Base URL of the model host.
    pub endpoint: String,
    /// Model checkpoint to load.
    pub model: String,
    /// Maximal number of sequences per scoring request.
    pub batch_size: usize,
    /// Timeout of a single request; loading the weights can take minutes.
    pub timeout: Duration,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_string(),
            model: DEFAULT_MODEL.to_string(),
            batch_size: 16,
            timeout: Duration::from_secs(1000),
        }
    }
}

/// Body of `POST /load`.
#[derive(Debug, Clone, serde::Serialize)]
struct LoadRequest<'a> {
    model: &'a str,
}

/// Body of `POST /score`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoreRequest<'a> {
    pub model: &'a str,
    pub sequences: &'a [String],
}

/// Response of `POST /score`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScoreResponse {
    pub scores: Vec<f64>,
}

impl ScoreResponse {
    /// Check that the host returned exactly `expected` scores.
    pub fn into_scores(self, expected: usize) -> Result<Vec<f64>> {
        if self.scores.len() != expected {
            return Err(Error::Scorer(format!(
                "model host returned {} scores for {} sequences",
                self.scores.len(),
                expected
            )));
        }
        Ok(self.scores)
    }
}

/// Handle to a loaded model on the remote host.
#[derive(Debug, Clone)]
pub struct RemoteScorer {
    client: Client,
    config: ScorerConfig,
}

impl RemoteScorer {
    /// Load the configured model on the host and return the handle.
    ///
    /// # Errors
    ///
    /// If the host cannot be reached or refuses to load the model.
    pub fn load(config: &ScorerConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::Scorer("batch size must be positive".into()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;

        tracing::info!("Loading Evo2 model {}...", &config.model);
        let before_loading = std::time::Instant::now();
        let response = client
            .post(format!("{}/load", config.endpoint.trim_end_matches('/')))
            .json(&LoadRequest {
                model: &config.model,
            })
            .send()?;
        if !response.status().is_success() {
            return Err(Error::Scorer(format!(
                "model host failed to load {}: {}",
                &config.model,
                response.status()
            )));
        }
        tracing::info!("Evo2 model loaded in {:?}", before_loading.elapsed());

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>> {
        let response = self
            .client
            .post(format!(
                "{}/score",
                self.config.endpoint.trim_end_matches('/')
            ))
            .json(&ScoreRequest {
                model: &self.config.model,
                sequences,
            })
            .send()?;
        if !response.status().is_success() {
            return Err(Error::Scorer(format!(
                "model host returned status {}",
                response.status()
            )));
        }
        response.json::<ScoreResponse>()?.into_scores(sequences.len())
    }
}

impl LikelihoodScorer for RemoteScorer {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn score_sequences(&self, sequences: &[String]) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(sequences.len());
        for chunk in sequences.chunks(self.config.batch_size) {
            tracing::debug!("scoring batch of {} sequences", chunk.len());
            scores.extend(self.score_batch(chunk)?);
        }
        Ok(scores)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    /// Deterministic stand-in for the model.
    ///
    /// The score is the negated mean of per-base weights, so the same sequence always
    /// gets the same score and single substitutions move it by a known amount.
    pub(crate) struct WeightScorer {
        pub weights: [f64; 4],
        pub calls: AtomicUsize,
        pub scored: AtomicUsize,
    }

    impl WeightScorer {
        pub fn new(weights: [f64; 4]) -> Self {
            Self {
                weights,
                calls: AtomicUsize::new(0),
                scored: AtomicUsize::new(0),
            }
        }

        pub fn score_one(&self, sequence: &str) -> f64 {
            let total: f64 = sequence
                .bytes()
                .map(|b| match b {
                    b'A' => self.weights[0],
                    b'C' => self.weights[1],
                    b'G' => self.weights[2],
                    b'T' => self.weights[3],
                    _ => 0.0,
                })
                .sum();
            -total / sequence.len().max(1) as f64
        }
    }

    impl LikelihoodScorer for WeightScorer {
        fn model_name(&self) -> &str {
            "weights"
        }

        fn score_sequences(&self, sequences: &[String]) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.scored.fetch_add(sequences.len(), Ordering::SeqCst);
            Ok(sequences.iter().map(|s| self.score_one(s)).collect())
        }
    }

    #[test]
    fn score_response_count() -> anyhow::Result<()> {
        let response: ScoreResponse = serde_json::from_str(r#"{"scores": [-0.5, -0.25]}"#)?;
        assert_eq!(response.clone().into_scores(2)?, vec![-0.5, -0.25]);
        assert!(matches!(response.into_scores(3), Err(Error::Scorer(_))));
        Ok(())
    }

    #[test]
    fn score_request_body() -> anyhow::Result<()> {
        let sequences = vec!["ACGT".to_string(), "ACGA".to_string()];
        let body = serde_json::to_value(ScoreRequest {
            model: DEFAULT_MODEL,
            sequences: &sequences,
        })?;
        assert_eq!(
            body,
            serde_json::json!({"model": "evo2_7b", "sequences": ["ACGT", "ACGA"]})
        );
        Ok(())
    }

    #[test]
    fn load_rejects_zero_batch_size() {
        let config = ScorerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(RemoteScorer::load(&config), Err(Error::Scorer(_))));
    }

    mod over_http {
        use std::sync::Mutex;

        use actix_web::{web, HttpResponse};
        use pretty_assertions::assert_eq;

        use crate::common::fake_server;
        use crate::error::Error;

        use super::super::{LikelihoodScorer, RemoteScorer, ScoreResponse, ScorerConfig};

        #[derive(Debug, serde::Deserialize)]
        struct ScoreBody {
            model: String,
            sequences: Vec<String>,
        }

        /// Requests seen by the fake model host, as `(model, batch)`.
        type Seen = web::Data<Mutex<Vec<(String, Vec<String>)>>>;

        async fn load_ok() -> HttpResponse {
            HttpResponse::Ok().json(serde_json::json!({"status": "loaded"}))
        }

        /// Score each sequence by its negated length.
        async fn score(body: web::Json<ScoreBody>, seen: Seen) -> HttpResponse {
            let body = body.into_inner();
            let scores = body
                .sequences
                .iter()
                .map(|s| -(s.len() as f64))
                .collect::<Vec<_>>();
            if let Ok(mut seen) = seen.lock() {
                seen.push((body.model, body.sequences));
            }
            HttpResponse::Ok().json(ScoreResponse { scores })
        }

        fn config(endpoint: String, batch_size: usize) -> ScorerConfig {
            ScorerConfig {
                endpoint,
                batch_size,
                ..Default::default()
            }
        }

        #[test]
        fn scores_in_batches_keeping_order() -> anyhow::Result<()> {
            let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
            let base_url = fake_server::spawn({
                let seen = seen.clone();
                move |cfg: &mut web::ServiceConfig| {
                    cfg.app_data(seen.clone())
                        .route("/load", web::post().to(load_ok))
                        .route("/score", web::post().to(score));
                }
            })?;
            let scorer = RemoteScorer::load(&config(base_url, 2))?;
            let sequences = ["A", "AC", "ACG", "ACGT", "ACGTA"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>();

            let scores = scorer.score_sequences(&sequences)?;

            assert_eq!(scores, vec![-1.0, -2.0, -3.0, -4.0, -5.0]);
            let seen = seen.lock().unwrap();
            assert_eq!(
                seen.iter().map(|(_, batch)| batch.len()).collect::<Vec<_>>(),
                vec![2, 2, 1]
            );
            assert!(seen.iter().all(|(model, _)| model == "evo2_7b"));
            assert_eq!(
                seen.iter()
                    .flat_map(|(_, batch)| batch.iter().cloned())
                    .collect::<Vec<_>>(),
                sequences
            );
            Ok(())
        }

        #[test]
        fn load_failure() -> anyhow::Result<()> {
            let base_url = fake_server::spawn(|cfg: &mut web::ServiceConfig| {
                cfg.route(
                    "/load",
                    web::post().to(|| async { HttpResponse::InternalServerError().finish() }),
                );
            })?;

            let err = RemoteScorer::load(&config(base_url, 2)).unwrap_err();

            assert!(matches!(err, Error::Scorer(_)));
            assert!(err.to_string().contains("failed to load evo2_7b"), "{}", err);
            Ok(())
        }

        #[test]
        fn score_count_mismatch() -> anyhow::Result<()> {
            let base_url = fake_server::spawn(|cfg: &mut web::ServiceConfig| {
                cfg.route("/load", web::post().to(load_ok)).route(
                    "/score",
                    web::post().to(|| async {
                        HttpResponse::Ok().json(ScoreResponse { scores: vec![-1.0] })
                    }),
                );
            })?;
            let scorer = RemoteScorer::load(&config(base_url, 4))?;

            let err = scorer
                .score_sequences(&["ACGT".to_string(), "ACGA".to_string()])
                .unwrap_err();

            assert!(matches!(err, Error::Scorer(_)));
            Ok(())
        }
    }

    #[test]
    fn weight_scorer_is_deterministic() -> Result<()> {
        let scorer = WeightScorer::new([1.0, 2.0, 3.0, 4.0]);
        let sequences = vec!["ACGT".to_string(), "ACGT".to_string()];
        let scores = scorer.score_sequences(&sequences)?;
        assert_eq!(scores[0], scores[1]);
        assert_eq!(scores[0], -2.5);
        Ok(())
    }
}
