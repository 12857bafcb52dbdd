//! Endpoint pools for collaborator services

use std::sync::atomic::{AtomicUsize, Ordering};

use super::ClientError;

/// A named list of interchangeable service instances.
///
/// Each call picks the next instance in round-robin order.
#[derive(Debug)]
pub struct EndpointPool {
    service: String,
    endpoints: Vec<String>,
    next: AtomicUsize,
}

impl EndpointPool {
    pub fn new<I, S>(service: impl Into<String>, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service: service.into(),
            endpoints: endpoints
                .into_iter()
                .map(|e| e.into().trim_end_matches('/').to_string())
                .collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Base URL of the instance to use for the next call
    pub fn pick(&self) -> Result<&str, ClientError> {
        if self.endpoints.is_empty() {
            return Err(ClientError::NoEndpoint(self.service.clone()));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        Ok(&self.endpoints[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let pool = EndpointPool::new("device_manager", ["http://a", "http://b/", "http://c"]);

        let picks: Vec<_> = (0..6).map(|_| pool.pick().unwrap().to_string()).collect();
        assert_eq!(
            picks,
            vec!["http://a", "http://b", "http://c", "http://a", "http://b", "http://c"]
        );
    }

    #[test]
    fn test_single_endpoint() {
        let pool = EndpointPool::new("event_center", ["http://only"]);
        for _ in 0..3 {
            assert_eq!(pool.pick().unwrap(), "http://only");
        }
    }

    #[test]
    fn test_empty_pool() {
        let pool = EndpointPool::new("event_center", Vec::<String>::new());
        assert!(matches!(pool.pick(), Err(ClientError::NoEndpoint(s)) if s == "event_center"));
    }
}
