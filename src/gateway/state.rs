//! Shared gateway state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::directory::Directory;
use crate::gateway::forwarder::{Forwarder, UpstreamClient};
use crate::gateway::logs::LogRelay;
use crate::gateway::resolver::{CachedLookup, Resolver};
use crate::load_balancer::{LoadBalancer, RoundRobin};
use crate::resilience::RetryPolicy;

#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub forwarder: Arc<Forwarder>,
    pub balancer: Arc<dyn LoadBalancer>,
    pub cache: Arc<ResponseCache<CachedLookup>>,
    pub logs: Arc<LogRelay>,
    pub admin_enabled: bool,
    pub admin_key: Arc<str>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: &AppConfig, directory: Directory) -> Self {
        let balancer: Arc<dyn LoadBalancer> = Arc::new(RoundRobin::new(Duration::from_secs(
            config.load_balancer.cooldown_secs,
        )));
        Self::with_balancer(config, directory, balancer)
    }

    pub fn with_balancer(
        config: &AppConfig,
        directory: Directory,
        balancer: Arc<dyn LoadBalancer>,
    ) -> Self {
        let upstream_timeout = Duration::from_secs(config.timeouts.upstream_secs);
        let client = upstream_client(upstream_timeout);
        let cache = Arc::new(ResponseCache::new(config.cache.ttl()));

        let forwarder = Forwarder::new(
            client.clone(),
            balancer.clone(),
            RetryPolicy::new(config.retries.max_attempts),
            upstream_timeout,
        );
        let logs = LogRelay::new(client, config.gateway.log_store_url.clone(), upstream_timeout);

        Self {
            resolver: Arc::new(Resolver::new(directory, cache.clone())),
            forwarder: Arc::new(forwarder),
            balancer,
            cache,
            logs: Arc::new(logs),
            admin_enabled: config.admin.enabled,
            admin_key: Arc::from(config.admin.api_key.as_str()),
            started_at: Utc::now(),
        }
    }
}

fn upstream_client(connect_timeout: Duration) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}
