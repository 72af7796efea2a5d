use std::net::SocketAddr;
use std::sync::Arc;

use diesel::prelude::*;
use log::info;

use listing_api::config::AppConfig;
use listing_api::db;
use listing_api::handlers::app;
use listing_api::store::PgListingStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let mut conn = db::establish_connection(&config.database_url)?;
    let test_query: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
        .get_result(&mut conn)?;
    info!("Database test query result: {}", test_query);
    drop(conn);

    let store = Arc::new(PgListingStore::new(config.database_url.clone()));

    info!("Starting server on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app(store).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
