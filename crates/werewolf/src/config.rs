//! Server configuration.

/// Settings for a [`WerewolfServer`](crate::WerewolfServer).
///
/// Usually filled in through [`WerewolfServerBuilder`](crate::WerewolfServerBuilder);
/// the binary maps its command-line flags onto this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,

    /// Where `GET /new` redirects after resetting the global game.
    pub reset_redirect: String,

    /// When set, `GET /new` must carry `?key=<reset_key>` or it is refused.
    pub reset_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:43200".to_string(),
            reset_redirect: "/".to_string(),
            reset_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_open_local_listener() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:43200");
        assert_eq!(config.reset_redirect, "/");
        assert!(config.reset_key.is_none());
    }
}
