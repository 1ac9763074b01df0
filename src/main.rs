// src/main.rs

use bookshare::config::Config;
use bookshare::models::user::{AVATAR_IMAGES, Credential};
use bookshare::routes;
use bookshare::state::AppState;
use bookshare::store::books::BookStore;
use bookshare::store::members::{MemberStore, NewMember, RegisterOutcome};
use bookshare::utils::hash::hash_password;
use chrono::Utc;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Open the JSON-backed stores (documents are created empty on first run)
    let books = BookStore::open(config.data_dir.join("books.json"))
        .expect("Failed to open the book store");
    let members = MemberStore::open(
        config.data_dir.join("credentials.json"),
        config.data_dir.join("members.json"),
    )
    .expect("Failed to open the member store");

    tracing::info!("Stores loaded from {}", config.data_dir.display());

    let state = AppState {
        books: Arc::new(books),
        members: Arc::new(members),
        config: config.clone(),
    };

    // Seed Admin User
    if let Err(e) = seed_admin_user(&state.members, &config) {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

fn seed_admin_user(
    members: &MemberStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        if members.find_credential(username).is_some() {
            return Ok(());
        }

        tracing::info!("Seeding admin user: {}", username);
        let hashed_password = hash_password(password)?;

        let credential = Credential {
            username: username.clone(),
            password_hash: hashed_password,
            email: String::new(),
            description: None,
            zip_code: None,
            created_at: Utc::now(),
        };
        let profile = NewMember {
            name: username.clone(),
            phone: String::new(),
            email: String::new(),
            profile_image: AVATAR_IMAGES[0].to_string(),
            is_administrator: true,
            zip_code: None,
            description: None,
        };

        match members.register(credential, profile)? {
            RegisterOutcome::Registered(_) => {
                tracing::info!("Admin user created successfully.");
            }
            RegisterOutcome::DuplicateUsername => {}
        }
    }
    Ok(())
}
