use super::{HttpMethod, LogLevel, LogRecord, MESSAGE};
use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;
use uuid::Uuid;

pub const ENDPOINTS: [&str; 4] = ["/api/users", "/api/products", "/api/orders", "/api/login"];

/// Produces synthetic log records from a private random source.
///
/// Each producer owns its own synthesizer; the generator is never shared
/// between tasks.
pub struct Synthesizer {
    rng: SmallRng,
}

impl Synthesizer {
    /// Deterministic synthesizer. Everything except the timestamp is
    /// reproducible for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Synthesizer seeded from the operating system's entropy source
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn synthesize(&mut self) -> LogRecord {
        let level = LogLevel::ALL[self.rng.random_range(0..LogLevel::ALL.len())];
        let response_time_ms = self.rng.random_range(level.response_time_range());
        let correlation_id = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        let source_ip = Ipv4Addr::from(self.rng.random::<[u8; 4]>());
        let method = HttpMethod::ALL[self.rng.random_range(0..HttpMethod::ALL.len())];
        let endpoint = ENDPOINTS[self.rng.random_range(0..ENDPOINTS.len())];

        LogRecord {
            timestamp: Utc::now(),
            level,
            correlation_id,
            source_ip,
            method,
            endpoint: endpoint.to_string(),
            status_code: level.status_code(),
            response_time_ms,
            message: MESSAGE.to_string(),
        }
    }

    /// Correlation ids of the next `count` records, consuming them.
    pub fn correlation_ids(&mut self, count: usize) -> Vec<Uuid> {
        (0..count).map(|_| self.synthesize().correlation_id).collect()
    }
}
