//! salesflow-web - Sales enablement service
//!
//! Product catalog browser, dossier (sales proposal) builder with PDF
//! generation, voice-note-to-CRM bridge, and inventory management, all
//! served from a single local web service.

use anyhow::Result;
use salesflow_common::config::{self, TomlConfig};
use salesflow_common::db;
use tracing::{info, warn};

use salesflow_web::{build_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!("Starting SalesFlow (salesflow-web) v{}", env!("CARGO_PKG_VERSION"));

    let toml_config = TomlConfig::load();
    let root_folder = config::resolve_root_folder(None, &toml_config);
    std::fs::create_dir_all(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = db::init_database(&db_path).await?;

    let images_dir = config::images_dir(&root_folder);
    std::fs::create_dir_all(&images_dir)?;

    // API keys are optional; voice/CRM endpoints report missing keys at call
    // time so the catalog and dossier features keep working offline
    let google_api_key =
        config::resolve_api_key("Google", "GOOGLE_API_KEY", toml_config.google_api_key.as_ref());
    let pipedrive_api_key = config::resolve_api_key(
        "Pipedrive",
        "PIPEDRIVE_API_KEY",
        toml_config.pipedrive_api_key.as_ref(),
    );

    let pipedrive_base_url = match toml_config.pipedrive_base_url {
        Some(url) => url,
        None => {
            db::init::get_setting(&pool, "pipedrive_base_url", "https://api.pipedrive.com/v1")
                .await?
        }
    };
    let gemini_model = db::init::get_setting(&pool, "gemini_model", "gemini-1.5-flash").await?;
    let default_salesperson =
        db::init::get_setting(&pool, "default_salesperson", "Sales Executive").await?;

    let timeout_ms: u64 = db::init::get_setting(&pool, "http_request_timeout_ms", "30000")
        .await?
        .parse()
        .unwrap_or_else(|_| {
            warn!("http_request_timeout_ms setting is not numeric, using 30000");
            30000
        });

    let http = reqwest::Client::builder()
        .user_agent(concat!("SalesFlow/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()?;

    let state = AppState::new(
        pool,
        http,
        ServiceConfig {
            root_folder,
            images_dir,
            google_api_key,
            pipedrive_api_key,
            pipedrive_base_url,
            gemini_model,
            default_salesperson,
        },
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5730").await?;
    info!("salesflow-web listening on http://127.0.0.1:5730");
    info!("Health check: http://127.0.0.1:5730/health");

    axum::serve(listener, app).await?;

    Ok(())
}
