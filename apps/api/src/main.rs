use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::models::BookingRules;
use appointment_cell::services::{
    AppointmentStore, BookingLedger, LocalAppointmentStore, MemoryAppointmentStore,
    SupabaseAppointmentStore,
};
use doctor_cell::services::{DoctorCatalog, StaticDoctorCatalog};
use shared_config::{AppConfig, LedgerStoreKind};
use shared_database::local_storage::LocalStorage;
use shared_database::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediSlot API server");

    let config = Arc::new(AppConfig::from_env());
    if !config.is_auth_configured() {
        warn!("SUPABASE_JWT_SECRET is not set; every authenticated route will answer 401");
    }

    let store = build_store(&config).await?;
    let catalog: Arc<dyn DoctorCatalog> = Arc::new(StaticDoctorCatalog::builtin());
    let ledger = BookingLedger::load(store, Arc::clone(&catalog), BookingRules::from_config(&config))
        .await
        .context("failed to load the booking ledger")?;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(Arc::clone(&config), catalog, Arc::new(ledger))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn AppointmentStore>> {
    let store: Arc<dyn AppointmentStore> = match config.ledger_store {
        LedgerStoreKind::Memory => {
            warn!("Using the in-memory appointment store; bookings are lost on restart");
            Arc::new(MemoryAppointmentStore::new())
        }
        LedgerStoreKind::Local => {
            let storage = LocalStorage::open(&config.ledger_storage_path)
                .await
                .with_context(|| format!("failed to open {}", config.ledger_storage_path))?;
            Arc::new(LocalAppointmentStore::new(storage))
        }
        LedgerStoreKind::Supabase => {
            if !config.is_supabase_configured() {
                bail!("LEDGER_STORE=supabase requires SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY");
            }
            Arc::new(SupabaseAppointmentStore::new(SupabaseClient::new(config)))
        }
    };

    info!("Appointment store: {:?}", config.ledger_store);
    Ok(store)
}
