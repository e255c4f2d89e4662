//! Pool configuration options

/// Configuration for object pool behavior
///
/// Holds only plain data, so it can be loaded from a config file when the
/// `serde` feature is enabled. The factory and hooks are supplied through
/// [`PoolBuilder`](crate::PoolBuilder).
///
/// # Examples
///
/// ```
/// use recycle_pool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_name("projectiles")
///     .with_preload(16)
///     .with_initial_capacity(64);
///
/// assert_eq!(config.preload_count, 16);
/// assert_eq!(config.initial_capacity, 64);
/// assert_eq!(config.name, "projectiles");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Pool name used in log fields and metric labels
    pub name: String,

    /// Number of instances created eagerly when the pool is built
    pub preload_count: usize,

    /// Storage reserved up front, in instances
    pub initial_capacity: usize,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            preload_count: 0,
            initial_capacity: 0,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of instances to preload
    pub fn with_preload(mut self, count: usize) -> Self {
        self.preload_count = count;
        self
    }

    /// Set the storage reservation hint
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Storage to reserve: never less than the preload population.
    pub(crate) fn reserve_hint(&self) -> usize {
        self.initial_capacity.max(self.preload_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::default();
        assert_eq!(config.preload_count, 0);
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.name, "pool");
    }

    #[test]
    fn test_reserve_hint_covers_preload() {
        let config = PoolConfiguration::new().with_preload(10).with_initial_capacity(4);
        assert_eq!(config.reserve_hint(), 10);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let config: PoolConfiguration =
            serde_json::from_str(r#"{ "name": "sparks", "preload_count": 3 }"#).unwrap();
        assert_eq!(config.name, "sparks");
        assert_eq!(config.preload_count, 3);
        assert_eq!(config.initial_capacity, 0);
    }
}
