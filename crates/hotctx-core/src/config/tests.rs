use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serial_test::serial;
use tracing_subscriber::layer::{Context, SubscriberExt};

use super::*;

const ENV_KEYS: [&str; 9] = [
    "HOTCTX_CONFIG",
    "HOTCTX_EMBEDDING_URL",
    "HOTCTX_EMBEDDING_MODEL",
    "HOTCTX_EMBEDDING_DIM",
    "HOTCTX_QDRANT_URL",
    "HOTCTX_COLLECTION",
    "HOTCTX_TOP_K",
    "HOTCTX_RELEVANCE_THRESHOLD",
    "HOTCTX_MAX_OUTPUT_KB",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(
        config.project.sources,
        vec![
            "docs/standards",
            "docs/architecture",
            "docs/architecture/decisions",
            "README.md"
        ]
    );
    assert_eq!(config.project.output, ".cursor/rules/context-hot.mdc");
    assert_eq!(config.embedding.url, "http://localhost:11434/api/embeddings");
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.embedding.dim, 768);
    assert_eq!(config.index.qdrant_url, "http://localhost:6334");
    assert_eq!(config.index.collection, "cursor_hot_context");
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 120);
    assert_eq!(config.chunking.min_chunk_size, 200);
    assert_eq!(config.retrieval.top_k, 12);
    assert!((config.retrieval.relevance_threshold - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.max_output_kb, 12);
    assert_eq!(config.retrieval.queries.len(), 3);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/hotctx.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn parse_partial_toml_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[project]
sources = ["docs", "CONTRIBUTING.md"]

[embedding]
model = "mxbai-embed-large"
dim = 1024

[retrieval]
top_k = 5
queries = ["error handling"]
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.project.sources, vec!["docs", "CONTRIBUTING.md"]);
    assert_eq!(config.project.output, ".cursor/rules/context-hot.mdc");
    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.embedding.dim, 1024);
    assert_eq!(config.embedding.url, "http://localhost:11434/api/embeddings");
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.retrieval.queries, vec!["error handling"]);
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
#[serial]
fn malformed_toml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[retrieval\ntop_k = ").unwrap();

    clear_env();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("HOTCTX_EMBEDDING_URL", "http://embed:8080/api/embed");
        std::env::set_var("HOTCTX_EMBEDDING_DIM", "384");
        std::env::set_var("HOTCTX_QDRANT_URL", "http://qdrant:6334");
        std::env::set_var("HOTCTX_COLLECTION", "other");
        std::env::set_var("HOTCTX_TOP_K", "4");
        std::env::set_var("HOTCTX_RELEVANCE_THRESHOLD", "0.5");
        std::env::set_var("HOTCTX_MAX_OUTPUT_KB", "20");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.embedding.url, "http://embed:8080/api/embed");
    assert_eq!(config.embedding.dim, 384);
    assert_eq!(config.index.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.index.collection, "other");
    assert_eq!(config.retrieval.top_k, 4);
    assert!((config.retrieval.relevance_threshold - 0.5).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.max_output_kb, 20);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("HOTCTX_EMBEDDING_DIM", "lots");
        std::env::set_var("HOTCTX_TOP_K", "-1");
        std::env::set_var("HOTCTX_MAX_OUTPUT_KB", "big");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.embedding.dim, 768);
    assert_eq!(config.retrieval.top_k, 12);
    assert_eq!(config.retrieval.max_output_kb, 12);
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
#[serial]
fn each_invalid_numeric_override_warns() {
    clear_env();
    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    unsafe {
        std::env::set_var("HOTCTX_EMBEDDING_DIM", "lots");
        std::env::set_var("HOTCTX_TOP_K", "many");
        std::env::set_var("HOTCTX_RELEVANCE_THRESHOLD", "high");
        std::env::set_var("HOTCTX_MAX_OUTPUT_KB", "big");
    }
    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(warnings.load(Ordering::SeqCst), 4);
}

#[test]
#[serial]
fn env_override_is_validated_on_load() {
    clear_env();
    unsafe { std::env::set_var("HOTCTX_RELEVANCE_THRESHOLD", "1.5") };
    let result = Config::load(Path::new("/nonexistent/hotctx.toml"));
    clear_env();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = Config::default();
    config.embedding.dim = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.chunking.min_chunk_size = 2000;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.retrieval.relevance_threshold = -0.1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.retrieval.queries.clear();
    assert!(config.validate().is_err());
}

#[test]
fn validate_accepts_threshold_bounds() {
    let mut config = Config::default();
    config.retrieval.relevance_threshold = 0.0;
    assert!(config.validate().is_ok());
    config.retrieval.relevance_threshold = 1.0;
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn resolve_path_precedence() {
    clear_env();
    let root = Path::new("/project");

    assert_eq!(
        Config::resolve_path(None, root),
        root.join(DEFAULT_CONFIG_PATH)
    );

    unsafe { std::env::set_var("HOTCTX_CONFIG", "/etc/hotctx.toml") };
    assert_eq!(
        Config::resolve_path(None, root),
        Path::new("/etc/hotctx.toml")
    );
    assert_eq!(
        Config::resolve_path(Some(Path::new("cli.toml")), root),
        Path::new("cli.toml")
    );
    clear_env();
}

#[test]
fn derived_component_configs() {
    let config = Config::default();
    let indexer = config.indexer_config();
    assert_eq!(indexer.embedding_dim, 768);
    assert_eq!(indexer.chunker.min_chunk_size, 200);
    assert!((config.retrieval_config().relevance_threshold - 0.7).abs() < f32::EPSILON);
    assert_eq!(
        config.output_path(Path::new("/p")),
        Path::new("/p/.cursor/rules/context-hot.mdc")
    );
}
