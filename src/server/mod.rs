mod handlers;
mod middleware;
mod routes;

pub use routes::create_router;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::db::Database;
use crate::scheduling::Scheduler;

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub scheduler: Scheduler,
}

impl AppState {
    /// Wire the scheduler to the database for all three of its collaborators
    pub fn new(db: Database) -> Self {
        let store = Arc::new(db.clone());
        let scheduler = Scheduler::new(store.clone(), store.clone(), store);
        Self { db, scheduler }
    }
}

/// Run the API server
pub async fn run_server(addr: SocketAddr, db_path: &str) -> Result<()> {
    let db = Database::open(db_path)?;
    tracing::info!("Using database at {}", db_path);

    let state = Arc::new(AppState::new(db));
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
