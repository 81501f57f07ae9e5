//! Helpers for exercising the engine against a throwaway SQLite database and a scripted payment provider.
mod fake_gateway;
mod prepare_env;
mod seed;

pub use fake_gateway::{FakeGateway, PayoutBehaviour, FAKE_WEBHOOK_SECRET};
pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
pub use seed::{add_to_cart, completed_outcome, seed_product, settle_paid_order};
