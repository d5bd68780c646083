//! Web4 chain core: keeper composition, transaction pipeline, law oracle,
//! and the witnessed block engine.

pub mod audit;
pub mod config;
pub mod engine;
pub mod genesis;
pub mod oracle;
pub mod pipeline;
pub mod query;
pub mod society;
pub mod validation;

pub use config::{EconomicsConfig, LedgerConfig};
pub use engine::{derive_mrh, EventRecord, Ledger};
pub use genesis::{apply_genesis, GenesisParams, GENESIS_TIMESTAMP_NS};
pub use oracle::{check_web4_compliance, Decision, LawOracle, OracleDecisionRecord};
pub use society::{RoleRecord, Society, SocietyLaw};
pub use validation::is_chain_valid;
