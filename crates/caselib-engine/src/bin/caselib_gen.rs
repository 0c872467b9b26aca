//! Caselib generation runner
//!
//! The operator trigger for the case aggregation pipeline: one batch per
//! invocation, reporting created/updated/total counts or a single failure.
//!
//! Usage:
//!   cargo run --bin caselib-gen -- --gallery data/gallery.json
//!   cargo run --bin caselib-gen -- --gallery-url https://app.example/gallery.json --mcqs
//!   cargo run --bin caselib-gen -- --model qwen3:8b --concurrency 8

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caselib_core::{defaults, ImageRepository, MetadataClassifier};
use caselib_engine::{
    CasePipeline, GalleryFileRepository, GalleryUrlRepository, JsonFileStore, PipelineConfig,
};
use caselib_inference::OllamaClassifier;

#[derive(Debug)]
struct Args {
    gallery: PathBuf,
    gallery_url: Option<String>,
    cases: PathBuf,
    case_studies: PathBuf,
    model: Option<String>,
    ollama_url: Option<String>,
    concurrency: Option<usize>,
    mcqs: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            gallery: PathBuf::from(defaults::GALLERY_PATH),
            gallery_url: None,
            cases: PathBuf::from(defaults::CASES_PATH),
            case_studies: PathBuf::from(defaults::CASE_STUDIES_PATH),
            model: None,
            ollama_url: None,
            concurrency: None,
            mcqs: false,
        }
    }
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--gallery" | "-g" => {
                i += 1;
                if i < args.len() {
                    result.gallery = PathBuf::from(&args[i]);
                }
            }
            "--gallery-url" | "-u" => {
                i += 1;
                if i < args.len() {
                    result.gallery_url = Some(args[i].clone());
                }
            }
            "--cases" => {
                i += 1;
                if i < args.len() {
                    result.cases = PathBuf::from(&args[i]);
                }
            }
            "--studies" => {
                i += 1;
                if i < args.len() {
                    result.case_studies = PathBuf::from(&args[i]);
                }
            }
            "--model" | "-m" => {
                i += 1;
                if i < args.len() {
                    result.model = Some(args[i].clone());
                }
            }
            "--ollama-url" => {
                i += 1;
                if i < args.len() {
                    result.ollama_url = Some(args[i].clone());
                }
            }
            "--concurrency" | "-c" => {
                i += 1;
                if i < args.len() {
                    match args[i].parse::<usize>() {
                        Ok(n) => result.concurrency = Some(n),
                        Err(_) => eprintln!("Invalid concurrency: {}. Ignoring.", args[i]),
                    }
                }
            }
            "--mcqs" => {
                result.mcqs = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(2);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!(
        "caselib-gen - generate/update the case library from gallery images

USAGE:
    caselib-gen [OPTIONS]

OPTIONS:
    -g, --gallery <FILE>      Gallery export document to read images from
                              (default: {gallery})
    -u, --gallery-url <URL>   Fetch the gallery export from a URL instead
        --cases <FILE>        Cases snapshot path (default: {cases})
        --studies <FILE>      Case-studies snapshot path (default: {studies})
    -m, --model <NAME>        Classification model (default: {model})
        --ollama-url <URL>    Ollama endpoint (default: {url})
    -c, --concurrency <N>     Max in-flight classifier calls (default: {conc})
        --mcqs                Also generate MCQs for each case study
    -h, --help                Show this help",
        gallery = defaults::GALLERY_PATH,
        cases = defaults::CASES_PATH,
        studies = defaults::CASE_STUDIES_PATH,
        model = defaults::CLASSIFY_MODEL,
        url = defaults::OLLAMA_URL,
        conc = defaults::CLASSIFY_CONCURRENCY,
    );
}

fn init_tracing() {
    // LOG_FORMAT - "json" or "text" (default: "text")
    // RUST_LOG   - standard env filter (default: "caselib=info")
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "caselib=info,caselib_engine=info,caselib_inference=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = parse_args();

    let classifier = {
        let mut base = OllamaClassifier::from_env();
        if args.model.is_some() || args.ollama_url.is_some() {
            let url = args
                .ollama_url
                .clone()
                .or_else(|| env::var(defaults::ENV_OLLAMA_URL).ok())
                .unwrap_or_else(|| defaults::OLLAMA_URL.to_string());
            let model = args
                .model
                .clone()
                .or_else(|| env::var(defaults::ENV_CLASSIFY_MODEL).ok())
                .unwrap_or_else(|| defaults::CLASSIFY_MODEL.to_string());
            base = OllamaClassifier::with_config(url, model);
        }
        Arc::new(base)
    };

    match classifier.health_check().await {
        Ok(true) => info!(model = classifier.model_name(), "Classifier backend reachable"),
        Ok(false) | Err(_) => warn!(
            "Classifier backend not reachable; images will fall back to unknown"
        ),
    }

    let repository: Arc<dyn ImageRepository> = match &args.gallery_url {
        Some(url) => Arc::new(GalleryUrlRepository::new(url.clone())),
        None => Arc::new(GalleryFileRepository::new(&args.gallery)),
    };
    let store = Arc::new(JsonFileStore::new(&args.cases, &args.case_studies));

    let config = PipelineConfig::from_env();
    let config = match args.concurrency {
        Some(n) => config.with_concurrency(n),
        None => config,
    }
    .with_mcqs(args.mcqs);

    let pipeline = CasePipeline::new(repository, classifier.clone(), store)
        .with_config(config)
        .with_mcq_generator(classifier);

    match pipeline.run().await {
        Ok(summary) => {
            println!("Case library updated: {}", summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("Case library generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
