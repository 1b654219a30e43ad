//! Contract caching

pub mod contract_cache;

pub use contract_cache::{
    CacheStats, Clock, ContractCache, ContractSource, DEFAULT_CONTRACT_TTL_SECS,
    FsContractSource, SystemClock,
};
