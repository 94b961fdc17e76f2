use actix_web::{web, HttpResponse, Responder};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::{Address, Block, LedgerEngine, LedgerError, Transaction, User};

/// Shared handle onto the ledger engine
pub type EngineData = web::Data<LedgerEngine>;

/// Request for the create user endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// The username to register
    pub username: String,

    /// Hex-encoded public key bytes; random bytes are generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Response for the get user endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserDetailResponse {
    /// The user record
    pub user: User,

    /// The user's current balance
    pub balance: u64,
}

/// Response for the balance endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// The queried address
    pub address: String,

    /// The balance held by the address
    pub balance: u64,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    pub amount: u64,
}

/// Request for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineRequest {
    /// The address the mining reward is credited to
    pub miner_address: String,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly mined block
    pub block: Block,
}

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Maps a ledger error onto the HTTP status it should surface as
fn error_response(err: &LedgerError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });

    match err {
        LedgerError::NotFound(_) => HttpResponse::NotFound().json(body),
        LedgerError::MiningTimeout { .. } => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Register a new user
///
/// Derives an address from the public key and credits the starting allowance
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Username already taken or malformed public key")
    )
)]
pub async fn create_user(
    engine: EngineData,
    user_req: web::Json<CreateUserRequest>,
) -> impl Responder {
    let public_key = match &user_req.public_key {
        Some(encoded) => match hex::decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid public key format. Must be a hex string."
                }));
            }
        },
        None => {
            let mut bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            bytes.to_vec()
        }
    };

    match engine.create_user(&user_req.username, &public_key) {
        Ok(user) => HttpResponse::Created().json(user),
        Err(err) => error_response(&err),
    }
}

/// List all registered users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<User>)
    )
)]
pub async fn list_users(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.users())
}

/// Get a user with their current balance
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    responses(
        (status = 200, description = "User retrieved successfully", body = UserDetailResponse),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_user(engine: EngineData, username: web::Path<String>) -> impl Responder {
    match engine.user(&username) {
        Ok(user) => {
            let balance = engine.balance_of(&user.address);
            HttpResponse::Ok().json(UserDetailResponse { user, balance })
        }
        Err(err) => error_response(&err),
    }
}

/// Get the balance of an address
///
/// Unknown addresses read as zero
#[utoipa::path(
    get,
    path = "/api/v1/balance/{address}",
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse)
    )
)]
pub async fn get_balance(engine: EngineData, address: web::Path<String>) -> impl Responder {
    let address = Address(address.into_inner());
    let balance = engine.balance_of(&address);

    HttpResponse::Ok().json(BalanceResponse {
        address: address.0,
        balance,
    })
}

/// Create a new transaction
///
/// Admits a transfer into the pending pool
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction admitted into the pool", body = Transaction),
        (status = 400, description = "Invalid amount or insufficient funds")
    )
)]
pub async fn new_transaction(
    engine: EngineData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let sender = Address(transaction_req.sender.clone());
    let recipient = Address(transaction_req.recipient.clone());

    match engine.create_transaction(&sender, &recipient, transaction_req.amount) {
        Ok(transaction) => HttpResponse::Created().json(transaction),
        Err(err) => error_response(&err),
    }
}

/// Get all pending transactions
///
/// Returns the transactions waiting for the next mined block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn pending_transactions(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.pending_transactions())
}

/// Mine a new block
///
/// Runs a full mining cycle: reward admission, pool drain, proof-of-work
/// search, chain append and balance application
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    request_body = MineRequest,
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 500, description = "Mining timed out")
    )
)]
pub async fn mine_block(engine: EngineData, mine_req: web::Json<MineRequest>) -> impl Responder {
    let engine = engine.into_inner();
    let reward_address = Address(mine_req.miner_address.clone());

    // the proof-of-work search is CPU-bound; keep it off the async workers
    let mined = web::block(move || engine.mine(&reward_address)).await;

    match mined {
        Ok(Ok(block)) => HttpResponse::Ok().json(MineResponse {
            message: "New block mined".to_string(),
            block,
        }),
        Ok(Err(err)) => error_response(&err),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Mining task failed: {}", err)
        })),
    }
}

/// Get the full chain
///
/// Returns every block and the chain's validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(engine: EngineData) -> impl Responder {
    let chain = engine.blocks();
    let is_valid = engine.is_valid();

    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    })
}

/// Get a summary of the chain state
#[utoipa::path(
    get,
    path = "/api/v1/chain/info",
    responses(
        (status = 200, description = "Chain info retrieved successfully", body = crate::ledger::ChainInfo)
    )
)]
pub async fn chain_info(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.chain_info())
}

/// Get a block by index
#[utoipa::path(
    get,
    path = "/api/v1/blocks/{index}",
    responses(
        (status = 200, description = "Block retrieved successfully", body = Block),
        (status = 404, description = "Index past the chain tip")
    )
)]
pub async fn get_block(engine: EngineData, index: web::Path<u64>) -> impl Responder {
    match engine.block_at(index.into_inner()) {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(err) => error_response(&err),
    }
}

/// Check if the chain is valid
///
/// Recomputes every block hash and checks linkage and proof of work
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Chain validation status", body = bool)
    )
)]
pub async fn validate_chain(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.is_valid())
}
