use actix_web::{web, App, HttpServer};
use paragen::server::{routes, AppState};
use paragen::{logger, Config, ImageClient, ImageStore, ParalonClient};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    logger::init_with_config(
        logger::LoggerConfig::development().with_level(logger::LogLevel::Debug),
    )?;

    let config = Config::from_env();

    log::info!("🔍 Checking Paralon environment...");
    if let Err(e) = config.paralon.validate() {
        log::error!("❌ {}", e);
        return Err(e.into());
    }
    log::info!("✅ Paralon credentials found");
    log::debug!(
        "API base: {}",
        config.paralon.api_base.as_deref().unwrap_or("(unset)")
    );

    config.storage.ensure_dirs()?;
    log::info!(
        "📁 Storage roots ready: {} / {}",
        config.storage.upload_dir,
        config.storage.generated_dir
    );

    log::info!("🔄 Creating Paralon client...");
    let client = match ParalonClient::new(config.paralon.clone()) {
        Ok(client) => {
            log::info!("✅ Paralon client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Paralon client: {}", e);
            return Err(e.into());
        }
    };

    log::info!("🖼️  Available image generation models:");
    for (id, name, provider) in ImageClient::supported_models() {
        log::info!("  {} - {} ({})", id, name, provider);
    }

    let store = ImageStore::new(&config.storage)?;
    let port = config.port.unwrap_or(8000);

    logger::log_startup_info("paragen", env!("CARGO_PKG_VERSION"), port);

    let state = web::Data::new(AppState { client, store });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(routes::health)
            .service(routes::generate)
            .service(routes::edit)
            .service(routes::variation)
            .service(routes::style_transfer)
            .service(routes::serve_generated)
            .service(routes::serve_upload)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
