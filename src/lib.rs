pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod inquiry;
pub mod models;
pub mod schema;
pub mod search;
pub mod store;
