use astra::Server;
use chrono::Utc;
use cma_engine::config::AppConfig;
use cma_engine::db::connection::{init_db, Database};
use cma_engine::jobs::run_seller_updates;
use cma_engine::notifier::LogNotifier;
use cma_engine::responses::error_response;
use cma_engine::router::{handle, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // 1️⃣ Logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cma_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2️⃣ Configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {e}");
            std::process::exit(1);
        }
    };

    // 3️⃣ Create the database handle and apply the schema
    let db = Database::new(config.db_path.clone());
    if let Err(e) = init_db(&db, &config.schema_path) {
        error!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    // `cma_engine seller-updates` runs the job once and exits; scheduling is cron's job.
    if std::env::args().nth(1).as_deref() == Some("seller-updates") {
        match run_seller_updates(&db, &LogNotifier, Utc::now(), config.seller_update_limit) {
            Ok(outcome) => info!(?outcome, "seller updates complete"),
            Err(e) => {
                error!("Seller update run failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    // 4️⃣ Start the server
    let addr = config.bind_addr;
    let server = Server::bind(&addr).max_workers(config.max_workers);
    let state = AppState::new(db, config);
    info!("Starting server at http://{addr}");

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_response(err),
    });

    if let Err(e) = result {
        error!("Server ended with error: {e}");
    }

    info!("Server shut down cleanly.");
}
