use web4_core::constants::{
    ADP_RATIO_MAX, ATP_DAILY_MAX, ATP_MAX_AMOUNT, DEFAULT_BLOCK_TIMEOUT_MS, DEFAULT_DIFFICULTY,
    DEFAULT_MAX_PENDING, MINING_REWARD_ATP, WITNESS_REWARD_MIN,
};

/// Economic rules the law oracle enforces.
#[derive(Clone, Debug)]
pub struct EconomicsConfig {
    pub atp_max_amount: f64,
    pub atp_daily_max: f64,
    pub adp_ratio_max: f64,
    pub witness_reward_min: f64,
    pub mining_reward: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            atp_max_amount: ATP_MAX_AMOUNT,
            atp_daily_max: ATP_DAILY_MAX,
            adp_ratio_max: ADP_RATIO_MAX,
            witness_reward_min: WITNESS_REWARD_MIN,
            mining_reward: MINING_REWARD_ATP,
        }
    }
}

/// Ledger runtime configuration. The node binary fills this from flags and
/// the `LEDGER_*` environment variables.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub society_id: String,
    pub law_oracle_id: String,
    /// Leading zero hex digits required of a block hash.
    pub difficulty: u32,
    /// Admission limit of the pending transaction buffer.
    pub max_pending: usize,
    /// Sealing deadline enforced by the embedding node (the engine itself
    /// stays deterministic and never reads a clock).
    pub block_timeout_ms: u64,
    pub economics: EconomicsConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            society_id: "society:web4".into(),
            law_oracle_id: "oracle:law-genesis".into(),
            difficulty: DEFAULT_DIFFICULTY,
            max_pending: DEFAULT_MAX_PENDING,
            block_timeout_ms: DEFAULT_BLOCK_TIMEOUT_MS,
            economics: EconomicsConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Apply `LEDGER_DIFFICULTY`, `LEDGER_MAX_PENDING`, and
    /// `LEDGER_BLOCK_TIMEOUT_MS` on top of the current values.
    pub fn with_env(mut self) -> Self {
        if let Some(v) = env_parse("LEDGER_DIFFICULTY") {
            self.difficulty = v;
        }
        if let Some(v) = env_parse("LEDGER_MAX_PENDING") {
            self.max_pending = v;
        }
        if let Some(v) = env_parse("LEDGER_BLOCK_TIMEOUT_MS") {
            self.block_timeout_ms = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
