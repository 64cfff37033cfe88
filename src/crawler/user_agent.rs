//! User agent rotation
//!
//! Each request asks the source for a user agent; the bundled source picks
//! one at random from a pool.

use crate::config::UserAgentConfig;
use rand::seq::IndexedRandom;

/// Used when no other user agent is available
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0";

/// Desktop browser strings used when the configuration supplies none
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.67",
];

/// Source of user agent strings
pub trait UserAgentSource: Send + Sync {
    /// Returns the user agent for the next request; never empty
    fn next_user_agent(&self) -> String;
}

/// Picks a random user agent from a pool for every request
#[derive(Debug, Clone)]
pub struct RotatingUserAgents {
    agents: Vec<String>,
    fallback: String,
}

impl RotatingUserAgents {
    pub fn new(agents: Vec<String>, fallback: impl Into<String>) -> Self {
        let fallback = fallback.into();
        Self {
            agents: agents.into_iter().filter(|a| !a.trim().is_empty()).collect(),
            fallback: if fallback.trim().is_empty() {
                FALLBACK_USER_AGENT.to_string()
            } else {
                fallback
            },
        }
    }

    /// Uses the configured pool, or the built-in pool when none is configured
    pub fn from_config(config: &UserAgentConfig) -> Self {
        let agents = match &config.agents {
            Some(agents) => agents.clone(),
            None => DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect(),
        };
        Self::new(agents, config.fallback.clone())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl UserAgentSource for RotatingUserAgents {
    fn next_user_agent(&self) -> String {
        self.agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Always returns the same user agent
#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl UserAgentSource for FixedUserAgent {
    fn next_user_agent(&self) -> String {
        self.0.clone()
    }
}
