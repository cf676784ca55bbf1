use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use tiersync::config::Config;
use tiersync::directory::ClerkClient;
use tiersync::handlers;
use tiersync::payments::WebhookVerifier;
use tiersync::store::{AppState, SupabaseStore};
use tiersync::sync;

#[derive(Parser, Debug)]
#[command(name = "tiersync")]
#[command(about = "Keeps Supabase user and subscription rows in sync with Clerk and LemonSqueezy")]
struct Cli {
    /// Import every Clerk user into Supabase, then exit
    #[arg(long)]
    sync_users: bool,

    /// Import a single Clerk user by id, then exit
    #[arg(long, value_name = "CLERK_ID")]
    sync_user: Option<String>,

    /// Directory page size for --sync-users
    #[arg(long, default_value_t = 100)]
    page_size: u32,
}

fn clerk_client(config: &Config) -> ClerkClient {
    let Some(secret_key) = config.clerk_secret_key.as_deref() else {
        eprintln!("CLERK_SECRET_KEY must be set for user import");
        std::process::exit(1);
    };
    ClerkClient::new(secret_key).expect("Failed to build Clerk client")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiersync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    let store = SupabaseStore::new(&config.supabase_url, &config.supabase_service_key)
        .expect("Failed to build Supabase client");

    // One-shot import modes (before normal startup)
    if let Some(clerk_id) = cli.sync_user.as_deref() {
        let directory = clerk_client(&config);
        if let Err(e) = sync::sync_one_user(&directory, &store, clerk_id).await {
            eprintln!("User import failed: {}", e);
            std::process::exit(1);
        }
        return;
    }
    if cli.sync_users {
        let directory = clerk_client(&config);
        match sync::sync_users(&directory, &store, cli.page_size).await {
            Ok(outcome) => {
                println!("Imported {} users, skipped {}", outcome.imported, outcome.skipped);
            }
            Err(e) => {
                eprintln!("User import failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let verifier = WebhookVerifier::new(config.lemonsqueezy_webhook_secret.clone());
    if verifier.enforcing() {
        tracing::info!("LemonSqueezy webhook signature verification enabled");
    } else {
        tracing::warn!(
            "LEMONSQUEEZY_WEBHOOK_SECRET is not set, webhook signatures will NOT be verified"
        );
    }
    if config.product_map.is_empty() {
        tracing::warn!(
            "LEMONSQUEEZY_PRODUCT_MAP is empty, subscription_created events cannot be mapped to a tier"
        );
    }

    let state = AppState {
        store: Arc::new(store),
        verifier,
        product_map: config.product_map.clone(),
    };

    // Build the application router
    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router())
        // Webhook endpoints (signature auth)
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Tiersync server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
