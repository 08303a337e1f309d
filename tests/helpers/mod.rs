pub mod builders;
pub mod db;
pub mod engine;
pub mod mock_provider;

pub use builders::{GrantBuilder, PrincipalBuilder};
pub use db::{seed_test_principal, TestDb};
pub use engine::{test_engine, test_engine_with_settings, test_keys, test_signer};
pub use mock_provider::MockProvider;
