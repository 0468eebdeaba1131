const DEFAULT_MAX_STORE_RETRY_ATTEMPTS: u16 = 3;
const DEFAULT_STORE_RETRY_INTERVAL_IN_MS: u32 = 100;

/// Retry policy for block persistence. `max_retry_attempts` counts retries
/// after the first attempt: the default of 3 yields 4 store attempts in total
/// before the failure is escalated as fatal. The total of 4 is a deliberate
/// constant of the commit protocol, not an off-by-one.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retry_attempts: u16,
    pub retry_interval_in_ms: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_STORE_RETRY_ATTEMPTS,
            retry_interval_in_ms: DEFAULT_STORE_RETRY_INTERVAL_IN_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_four_attempts_in_total() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retry_attempts + 1, 4);
    }
}
