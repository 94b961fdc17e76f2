// API module
//
// This module contains the HTTP layer over the ledger engine

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
