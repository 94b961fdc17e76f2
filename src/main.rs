use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod ledger;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::create_user,
        api::handlers::list_users,
        api::handlers::get_user,
        api::handlers::get_balance,
        api::handlers::new_transaction,
        api::handlers::pending_transactions,
        api::handlers::mine_block,
        api::handlers::get_chain,
        api::handlers::chain_info,
        api::handlers::get_block,
        api::handlers::validate_chain
    ),
    components(
        schemas(
            ledger::Block,
            ledger::Transaction,
            ledger::Address,
            ledger::User,
            ledger::ChainInfo,
            api::handlers::CreateUserRequest,
            api::handlers::UserDetailResponse,
            api::handlers::BalanceResponse,
            api::handlers::TransactionRequest,
            api::handlers::MineRequest,
            api::handlers::MineResponse,
            api::handlers::ChainResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger engine API endpoints")
    ),
    info(
        title = "Pocketledger API",
        version = "1.0.0",
        description = "An educational single-node ledger with proof-of-work mining",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // All state is process-lifetime only; a restart starts a fresh chain
    let engine = web::Data::new(ledger::LedgerEngine::default());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080u16);

    info!("Starting HTTP server at http://localhost:{}", port);

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(engine.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
