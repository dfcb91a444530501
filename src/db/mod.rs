pub mod entities;
pub mod models;
pub mod reconcile;
pub mod schema;
pub mod services;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Opens the connection pool used by the whole application.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections)
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// A fresh in-memory SQLite database with all tables created.
///
/// A single pooled connection keeps every query on the same in-memory database.
#[cfg(test)]
pub(crate) async fn test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    schema::create_tables(&db)
        .await
        .expect("Failed to create tables");
    db
}
