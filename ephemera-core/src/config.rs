use std::time::Duration;

/// Default time-to-live for records created without an explicit TTL (60 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default minimum token length `L0`; generated tokens are always at least `L0 + 1` long
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

/// Default upper bound for forced length bumps
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 12;

/// Default number of generation attempts at one length before bumping it
pub const DEFAULT_MAX_ATTEMPTS_PER_LENGTH: u32 = 32;

/// Configuration shared by the link and resource stores
///
/// # Example
///
/// ```rust
/// use ephemera_core::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_default_ttl(Duration::from_secs(600))
///     .with_sweep_interval(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// TTL applied when a caller does not supply one (default: 60 minutes)
    pub default_ttl: Duration,
    /// Minimum token length `L0` fed to the length policy (default: 2)
    pub min_token_length: usize,
    /// Longest length the bounded-retry fallback may bump to (default: 12)
    pub max_token_length: usize,
    /// Attempts per length before a forced bump (default: 32)
    pub max_attempts_per_length: u32,
    /// Upper bound on a single backing-medium check (default: 2 seconds)
    pub verify_timeout: Duration,
    /// Interval between background sweeps (default: 5 minutes)
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
            max_attempts_per_length: DEFAULT_MAX_ATTEMPTS_PER_LENGTH,
            verify_timeout: Duration::from_secs(2),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL used when a record is created without one
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the minimum token length `L0`
    ///
    /// The max length is raised if needed so it never sits below `L0 + 1`.
    pub fn with_min_token_length(mut self, length: usize) -> Self {
        self.min_token_length = length;
        self.max_token_length = self.max_token_length.max(length + 1);
        self
    }

    /// Sets the longest token length the generator may be forced up to
    pub fn with_max_token_length(mut self, length: usize) -> Self {
        self.max_token_length = length.max(self.min_token_length + 1);
        self
    }

    /// Sets how many collisions are tolerated at one length before bumping it
    pub fn with_max_attempts_per_length(mut self, attempts: u32) -> Self {
        self.max_attempts_per_length = attempts.max(1);
        self
    }

    /// Sets the bound on a single existence check against the backing medium
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    /// Sets the interval between background sweeps
    ///
    /// # Example
    ///
    /// ```rust
    /// use ephemera_core::StoreConfig;
    /// use std::time::Duration;
    ///
    /// // Sweep every 30 seconds
    /// let config = StoreConfig::default()
    ///     .with_sweep_interval(Duration::from_secs(30));
    /// ```
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.min_token_length, 2);
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = StoreConfig::new()
            .with_default_ttl(Duration::from_millis(1500))
            .with_verify_timeout(Duration::from_millis(100))
            .with_sweep_interval(Duration::from_secs(120));
        assert_eq!(config.default_ttl, Duration::from_millis(1500));
        assert_eq!(config.verify_timeout, Duration::from_millis(100));
        assert_eq!(config.sweep_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_max_length_never_below_first_generated_length() {
        let config = StoreConfig::new().with_max_token_length(1);
        assert_eq!(config.max_token_length, 3);

        let config = StoreConfig::new().with_min_token_length(20);
        assert_eq!(config.max_token_length, 21);
    }

    #[test]
    fn test_attempts_floor_is_one() {
        let config = StoreConfig::new().with_max_attempts_per_length(0);
        assert_eq!(config.max_attempts_per_length, 1);
    }
}
