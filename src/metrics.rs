//! Metrics collection and export for object pools

use std::collections::HashMap;

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use recycle_pool::ObjectPool;
///
/// let mut pool = ObjectPool::new(|| Vec::<u8>::with_capacity(256), 3).unwrap();
///
/// let handle = pool.acquire().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.active_objects, 1);
/// assert_eq!(metrics.pool_size, 3);
/// # pool.release(handle).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PoolMetrics {
    /// Total checkouts handed out
    pub total_acquired: usize,

    /// Total checkouts returned
    pub total_released: usize,

    /// Total instances produced by the factory
    pub total_created: usize,

    /// Releases rejected as double, stale or foreign
    pub protocol_violations: usize,

    /// Factory or hook calls that returned an error
    pub hook_failures: usize,

    /// Current active objects
    pub active_objects: usize,

    /// Current idle objects
    pub idle_objects: usize,

    /// Idle plus active
    pub pool_size: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("protocol_violations".to_string(), self.protocol_violations.to_string());
        metrics.insert("hook_failures".to_string(), self.hook_failures.to_string());
        metrics.insert("active_objects".to_string(), self.active_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("pool_size".to_string(), self.pool_size.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// Every series carries a `pool` label set to `pool_name` plus one label
    /// per tag. A tag named `pool` takes precedence over `pool_name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::ObjectPool;
    /// use std::collections::HashMap;
    ///
    /// let pool = ObjectPool::new(|| 0u32, 2).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "ui".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("buttons", Some(&tags)).unwrap();
    /// assert!(output.contains("objectpool_objects_idle"));
    /// assert!(output.contains("service=\"ui\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> Result<String, prometheus::Error> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

        let registry = Registry::new_custom(None, Some(Self::labels(pool_name, tags)))?;

        let gauges = [
            ("objectpool_objects_active", "Current active objects", metrics.active_objects),
            ("objectpool_objects_idle", "Current idle objects", metrics.idle_objects),
            ("objectpool_size", "Idle plus active objects", metrics.pool_size),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::new(name, help)?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let utilization = Gauge::new("objectpool_utilization", "Pool utilization ratio")?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization))?;

        let counters = [
            ("objectpool_acquired_total", "Total checkouts", metrics.total_acquired),
            ("objectpool_released_total", "Total returns", metrics.total_released),
            ("objectpool_created_total", "Instances created by the factory", metrics.total_created),
            (
                "objectpool_protocol_violations_total",
                "Rejected releases",
                metrics.protocol_violations,
            ),
            ("objectpool_hook_failures_total", "Failed factory or hook calls", metrics.hook_failures),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::new(name, help)?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    // A caller tag named `pool` overrides `pool_name`.
    fn labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut labels = HashMap::from([("pool".to_string(), pool_name.to_string())]);
        if let Some(tags) = tags {
            labels.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        labels
    }
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_acquired: usize,
    pub total_released: usize,
    pub total_created: usize,
    pub protocol_violations: usize,
    pub hook_failures: usize,
}

impl MetricsTracker {
    pub fn get_metrics(&self, active: usize, idle: usize) -> PoolMetrics {
        let pool_size = active + idle;
        let utilization = if pool_size > 0 {
            active as f64 / pool_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_acquired: self.total_acquired,
            total_released: self.total_released,
            total_created: self.total_created,
            protocol_violations: self.protocol_violations,
            hook_failures: self.hook_failures,
            active_objects: active,
            idle_objects: idle,
            pool_size,
            utilization,
        }
    }
}
