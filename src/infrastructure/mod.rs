pub mod card_repo;
pub mod directory_repo;
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod outbox;
