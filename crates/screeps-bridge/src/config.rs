//! Connection and reset configuration

use screeps_rl_core::Result;
use screeps_rl_env::config::parse_var;
use std::time::Duration;

/// Screeps server connection settings
#[derive(Debug, Clone)]
pub struct ScreepsConfig {
    /// `host[:port]` of the server
    pub host: String,
    /// Use https
    pub secure: bool,
    /// Account name (sign-in email on private servers)
    pub username: String,
    /// Account password
    pub password: String,
    /// Pre-issued API token; skips password sign-in when set
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ScreepsConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:21025".to_string(),
            secure: false,
            username: String::new(),
            password: String::new(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ScreepsConfig {
    /// Defaults overridden by `SCREEPS_HOST`, `SCREEPS_SECURE`,
    /// `SCREEPS_USER`, `SCREEPS_PASSWORD` and `SCREEPS_TOKEN`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("SCREEPS_HOST") {
            config.host = host;
        }
        if let Some(secure) = parse_var::<bool>("SCREEPS_SECURE")? {
            config.secure = secure;
        }
        if let Ok(user) = std::env::var("SCREEPS_USER") {
            config.username = user;
        }
        if let Ok(password) = std::env::var("SCREEPS_PASSWORD") {
            config.password = password;
        }
        if let Ok(token) = std::env::var("SCREEPS_TOKEN") {
            config.token = Some(token);
        }
        Ok(config)
    }

    /// Base URL derived from host and scheme
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host.trim_end_matches('/'))
    }
}

/// External command that restores the training room
#[derive(Debug, Clone)]
pub struct ResetConfig {
    /// Program to run
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["reset.py".to_string()],
            timeout: Duration::from_secs(120),
        }
    }
}

impl ResetConfig {
    /// Defaults overridden by `SCREEPS_RESET_CMD` (whitespace separated)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(cmd) = std::env::var("SCREEPS_RESET_CMD") {
            let mut parts = cmd.split_whitespace().map(str::to_string);
            if let Some(program) = parts.next() {
                config.program = program;
                config.args = parts.collect();
            }
        }
        config
    }
}
