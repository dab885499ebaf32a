//! Process-wide configuration.
//! All values are read once at startup from TASKDECK_* environment variables
//! and stay immutable for the process lifetime (signing key included).

/// Runtime configuration for the taskdeck server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub http_port: u16,
    /// Symmetric signing key for bearer tokens.
    pub token_key: String,
    /// Issuer claim stamped on and required from every token.
    pub issuer: String,
    /// Audience claim stamped on and required from every token.
    pub audience: String,
    /// Token validity window in seconds. Short-lived by design.
    pub token_ttl_secs: i64,
    /// Password for the bootstrap admin account created on first start.
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        let http_port = std::env::var("TASKDECK_HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let token_key = std::env::var("TASKDECK_TOKEN_KEY")
            .unwrap_or_else(|_| "taskdeck-dev-signing-key".to_string());
        let issuer = std::env::var("TASKDECK_TOKEN_ISSUER")
            .unwrap_or_else(|_| "taskdeck".to_string());
        let audience = std::env::var("TASKDECK_TOKEN_AUDIENCE")
            .unwrap_or_else(|_| "taskdeck-api".to_string());
        // Default matches the original deployment: tokens live for 5 minutes.
        let token_ttl_secs = std::env::var("TASKDECK_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let admin_password = std::env::var("TASKDECK_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "taskdeck".to_string());
        Self { http_port, token_key, issuer, audience, token_ttl_secs, admin_password }
    }
}
