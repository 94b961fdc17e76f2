use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/users", web::post().to(handlers::create_user))
            .route("/users", web::get().to(handlers::list_users))
            .route("/users/{username}", web::get().to(handlers::get_user))
            .route("/balance/{address}", web::get().to(handlers::get_balance))
            .route("/transactions", web::post().to(handlers::new_transaction))
            .route("/transactions/pending", web::get().to(handlers::pending_transactions))
            .route("/mine", web::post().to(handlers::mine_block))
            .route("/chain", web::get().to(handlers::get_chain))
            .route("/chain/info", web::get().to(handlers::chain_info))
            .route("/blocks/{index}", web::get().to(handlers::get_block))
            .route("/validate", web::get().to(handlers::validate_chain)),
    );
}
