pub mod error;
pub mod health;
pub mod movies;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(movies::configure).configure(health::configure);
}
