use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serbian_flash::{config, db::SqliteStore, handlers, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "serbian_flash=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_path = config::load_database_path();
  tracing::info!("Using database at {}", db_path.display());
  let store = SqliteStore::open(&db_path).expect("Failed to initialize database");

  let state = AppState::new(Arc::new(store));

  // Drop learners whose study state went idle
  let learners = state.learners.clone();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(15 * 60));
    loop {
      interval.tick().await;
      let removed = learners.cleanup_expired(Utc::now());
      if removed > 0 {
        tracing::debug!("Expired {} idle learner sessions", removed);
      }
    }
  });

  let app = handlers::router(state);

  let bind_addr = config::server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config::server_port());

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
