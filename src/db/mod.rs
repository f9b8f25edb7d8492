pub mod models;
pub mod schema;

use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use crate::config::app_config::DatabaseConfig;

pub type DbPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub fn create_pool(database: &DatabaseConfig) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&database.url);
    Pool::builder(manager)
        .max_size(database.max_connections as usize)
        .build()
        .expect("Failed to create database pool")
}
