//! In-memory contract cache
//!
//! Parsed contracts are kept per absolute source path. An entry is served
//! while it has not expired and the file on disk is not newer than the
//! version that was parsed.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::entities::Contract;
use crate::domain::errors::{ContractError, ensure_active};
use crate::infrastructure::parser::ContractLoader;

/// Default TTL for cached contracts (5 minutes)
pub const DEFAULT_CONTRACT_TTL_SECS: u64 = 300;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where contracts come from and how their freshness is checked
pub trait ContractSource: Send + Sync {
    fn load(&self, path: &Path, cancel: &CancellationToken) -> Result<Contract, ContractError>;

    fn modified(&self, path: &Path) -> std::io::Result<DateTime<Utc>>;
}

/// Filesystem-backed [`ContractSource`]
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContractSource;

impl ContractSource for FsContractSource {
    fn load(&self, path: &Path, cancel: &CancellationToken) -> Result<Contract, ContractError> {
        ContractLoader::parse_file(path, cancel)
    }

    fn modified(&self, path: &Path) -> std::io::Result<DateTime<Utc>> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    contract: Arc<Contract>,
    expires_at: DateTime<Utc>,
    source_mod_time: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn is_valid(&self, now: DateTime<Utc>, current_mod_time: DateTime<Utc>) -> bool {
        !self.is_expired(now) && current_mod_time <= self.source_mod_time
    }
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub ttl_seconds: u64,
}

/// TTL and modification-time invalidated contract cache
pub struct ContractCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    ttl: RwLock<Duration>,
    source: Arc<dyn ContractSource>,
    clock: Arc<dyn Clock>,
}

impl ContractCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_CONTRACT_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_parts(Arc::new(FsContractSource), Arc::new(SystemClock), ttl)
    }

    pub fn with_parts(
        source: Arc<dyn ContractSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: RwLock::new(ttl),
            source,
            clock,
        }
    }

    /// Return the cached contract for `path`, parsing it on a miss
    ///
    /// If the file cannot be stat-ed after a successful parse, the fresh
    /// contract is returned without being cached.
    #[instrument(skip(self, path, cancel), fields(path = %path.display()))]
    pub fn get_or_parse(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Arc<Contract>, ContractError> {
        ensure_active(cancel)?;
        let key = cache_key(path);

        let cached = self
            .entries
            .read()
            .ok()
            .and_then(|guard| guard.get(&key).cloned());

        if let Some(entry) = cached {
            ensure_active(cancel)?;
            match self.source.modified(&key) {
                Ok(mod_time) if entry.is_valid(self.clock.now(), mod_time) => {
                    debug!("Contract cache hit");
                    return Ok(entry.contract);
                }
                Ok(_) => debug!("Cached contract is stale"),
                Err(e) => debug!(error = %e, "Cached contract source is not accessible"),
            }
        }

        ensure_active(cancel)?;
        let stat = self.source.modified(&key);
        let contract = Arc::new(self.source.load(&key, cancel)?);

        ensure_active(cancel)?;
        match stat {
            Ok(source_mod_time) => {
                let expires_at = self.clock.now() + self.ttl_delta();
                if let Ok(mut guard) = self.entries.write() {
                    guard.insert(
                        key,
                        CacheEntry {
                            contract: Arc::clone(&contract),
                            expires_at,
                            source_mod_time,
                        },
                    );
                }
                debug!(expires_at = %expires_at, "Contract cached");
            }
            Err(e) => {
                warn!(error = %e, "Could not stat contract before parsing, returning uncached");
            }
        }

        Ok(contract)
    }

    /// Change the TTL applied to entries inserted from now on
    pub fn set_ttl(&self, ttl: Duration) {
        if let Ok(mut guard) = self.ttl.write() {
            *guard = ttl;
        }
        info!(ttl_seconds = ttl.as_secs(), "Contract cache TTL updated");
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
            .read()
            .map(|guard| *guard)
            .unwrap_or(Duration::from_secs(DEFAULT_CONTRACT_TTL_SECS))
    }

    pub fn clear_cache(&self) {
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
        debug!("Contract cache cleared");
    }

    pub fn remove_cache(&self, path: &Path) {
        let key = cache_key(path);
        if let Ok(mut guard) = self.entries.write() {
            guard.remove(&key);
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let Ok(mut guard) = self.entries.write() else {
            return 0;
        };
        let before = guard.len();
        guard.retain(|_, entry| !entry.is_expired(now));
        let removed = before - guard.len();
        if removed > 0 {
            debug!(removed, "Removed expired contracts");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let (total, valid) = self
            .entries
            .read()
            .map(|guard| {
                let valid = guard.values().filter(|e| !e.is_expired(now)).count();
                (guard.len(), valid)
            })
            .unwrap_or((0, 0));

        CacheStats {
            total,
            valid,
            expired: total - valid,
            ttl_seconds: self.ttl().as_secs(),
        }
    }

    fn ttl_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl()).unwrap_or_else(|_| chrono::Duration::days(36_500))
    }
}

impl Default for ContractCache {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
