//! Worker configuration

/// Configuration for the job worker and its queue
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue name, used in logs and metric labels
    pub queue_name: String,

    /// Maximum concurrent jobs to process
    pub max_concurrent_jobs: usize,

    /// Jobs buffered in the queue before `enqueue` waits
    pub queue_capacity: usize,
}

impl WorkerConfig {
    /// Create a new WorkerConfig with defaults for everything but the name
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            max_concurrent_jobs: 1,
            queue_capacity: 1024,
        }
    }

    /// Set the maximum concurrent jobs
    pub fn with_max_concurrent_jobs(mut self, count: usize) -> Self {
        self.max_concurrent_jobs = count.max(1);
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let config = WorkerConfig::new("emails")
            .with_max_concurrent_jobs(4)
            .with_queue_capacity(16);

        assert_eq!(config.queue_name, "emails");
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = WorkerConfig::default()
            .with_max_concurrent_jobs(0)
            .with_queue_capacity(0);

        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.queue_capacity, 1);
    }
}
