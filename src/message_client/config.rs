use std::time::Duration;

/// Configuration for the mock message client and the demo pipeline.
///
/// ```
/// use std::time::Duration;
/// use rxlite::message_client::ClientConfig;
///
/// let mut cfg = ClientConfig::default();
/// cfg.interval = Duration::from_millis(250);
/// cfg.seed = Some(7);
///
/// assert_eq!(cfg.string_limit, 2);
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Delay between two messages.
    pub interval: Duration,
    /// Seed for picking messages. `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// How many string messages the string branch takes before completing.
    pub string_limit: usize,
    /// How many number messages the number branch takes before completing.
    pub number_limit: usize,
}

impl Default for ClientConfig {
    /// Provides a default configuration:
    /// - `interval = 1s`
    /// - `seed = None`
    /// - `string_limit = 2`
    /// - `number_limit = 3`
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            seed: None,
            string_limit: 2,
            number_limit: 3,
        }
    }
}
