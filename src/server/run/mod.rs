use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::AnalysisConfigBuilder;
use crate::classify::CalibrationParameters;
use crate::common::cli::{HostArgs, ScorerArgs, UcscArgs};
use crate::scoring::{LikelihoodScorer, RemoteScorer};
use crate::sequence::{
    fasta::FastaChromosome, ucsc::UcscClient, SequenceSource, DEFAULT_WINDOW_SIZE,
};

/// Implementation of Actix server.
pub mod actix_server;

/// Module with OpenAPI documentation.
pub mod openapi {
    use crate::analysis::{VariantAnalysis, VariantRequest};
    use crate::classify::{CalibrationParameters, Prediction};
    use crate::scoring::host::HostConfig;
    use crate::server::run::actix_server::versions::{
        ModelInfo, SoftwareVersions, VersionsInfoResponse,
    };

    use super::actix_server::{seqvars_analyse, versions, CustomError};

    /// Utoipa-based `OpenAPI` generation helper.
    #[derive(utoipa::OpenApi)]
    #[openapi(
        paths(versions::handle, seqvars_analyse::handle_with_openapi,),
        components(schemas(
            CustomError,
            VersionsInfoResponse,
            SoftwareVersions,
            ModelInfo,
            HostConfig,
            CalibrationParameters,
            VariantRequest,
            VariantAnalysis,
            Prediction,
        ))
    )]
    pub struct ApiDoc;
}

/// Command line arguments for `server run` command.
#[derive(clap::Parser, Debug)]
#[command(about = "Run Vareon REST API server", long_about = None)]
pub struct Args {
    /// Path to calibration parameters as written by `vareon calibrate`.
    ///
    /// The built-in BRCA1 parameters are used if missing.
    #[arg(long)]
    pub path_calibration: Option<PathBuf>,

    /// Serve reference windows from this FASTA chromosome instead of the UCSC API.
    #[arg(long)]
    pub path_reference: Option<PathBuf>,

    /// Genome assembly of `--path-reference`, e.g., `hg19`.
    #[arg(long, requires = "path_reference")]
    pub reference_genome: Option<String>,

    /// Number of bases around the variant.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: u64,

    /// Model host settings.
    #[command(flatten)]
    pub scorer: ScorerArgs,

    /// UCSC API settings.
    #[command(flatten)]
    pub ucsc: UcscArgs,

    /// Deployment settings of the model host.
    #[command(flatten)]
    pub host: HostArgs,

    /// Whether to suppress printing hints.
    #[arg(long, default_value_t = false)]
    pub suppress_hints: bool,

    /// IP to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub listen_host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub listen_port: u16,

    /// Number of worker threads, defaults to the number of CPUs.
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Print some hints via `tracing::info!`.
fn print_hints(args: &Args) {
    tracing::info!(
        "Launching server main on http://{}:{} ...",
        args.listen_host.as_str(),
        args.listen_port
    );

    // Short-circuit if no hints are to be
    if args.suppress_hints {
        return;
    }

    let prefix = format!(
        "try: http://{host}:{port}/",
        host = args.listen_host,
        port = args.listen_port
    );
    tracing::info!("{}swagger-ui/", prefix);
    tracing::info!("{}api/v1/versionsInfo", prefix);
    tracing::info!(
        "  curl -X POST -H 'Content-Type: application/json' \
        -d '{{\"variant_position\": 43119628, \"alternative\": \"G\", \
        \"genome\": \"hg38\", \"chromosome\": \"chr17\"}}' \
        http://{}:{}/api/v1/seqvars/analyse",
        args.listen_host,
        args.listen_port
    );
}

/// Build the sequence source from the command line.
fn sequence_source(args: &Args) -> Result<Arc<dyn SequenceSource>, anyhow::Error> {
    let source: Arc<dyn SequenceSource> = match &args.path_reference {
        Some(path) => Arc::new(
            FastaChromosome::from_path(path)?.with_genome(args.reference_genome.clone()),
        ),
        None => {
            tracing::info!("Using UCSC API at {}", &args.ucsc.ucsc_base_url);
            Arc::new(UcscClient::new(args.ucsc.to_config())?)
        }
    };
    Ok(source)
}

/// Main entry point for `server run` sub command.
///
/// # Errors
///
/// In the case that there is an error running the server.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    if let Some(log::Level::Trace | log::Level::Debug) = args_common.verbose.log_level() {
        // SAFETY: This environment variable is set during server initialization,
        // before any worker threads are spawned. At this point, only the main thread
        // is running, making this operation thread-safe.
        unsafe { std::env::set_var("RUST_LOG", "debug") };
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    // Load data that we need for running the server.  The blocking HTTP clients
    // must be created outside of the actix runtime.
    tracing::info!("Loading data...");
    let before_loading = std::time::Instant::now();
    let calibration = match &args.path_calibration {
        Some(path) => {
            tracing::info!("Loading calibration from {}", path.display());
            CalibrationParameters::from_path(path)?
        }
        None => CalibrationParameters::default(),
    };
    tracing::info!("Calibration parameters: {:?}", &calibration);
    let config = AnalysisConfigBuilder::default()
        .window_size(args.window_size)
        .calibration(calibration)
        .build()?;

    let host = args.host.to_config();
    tracing::info!("Model host: {:?}", &host);

    let source = sequence_source(args)?;
    let scorer: Arc<dyn LikelihoodScorer> =
        Arc::new(RemoteScorer::load(&args.scorer.to_config())?);

    let data = actix_web::web::Data::new(actix_server::WebServerData {
        source,
        scorer,
        config,
        host,
    });
    tracing::info!("... done loading data {:?}", before_loading.elapsed());

    // Print the server URL and some hints (the latter: unless suppressed).
    print_hints(args);
    // Launch the Actix web server.  We keep `data` so the blocking clients are
    // dropped here, outside of the runtime.
    actix_server::main(args, data.clone())?;
    drop(data);

    tracing::info!("All done. Have a nice day!");
    Ok(())
}
