use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,

    // Sessions
    pub session_dir: PathBuf,
    pub session_cookie: String,
    pub session_ttl_secs: u64,

    // Cookie policy. The cookie is always HttpOnly and browser-session
    // scoped; Secure can be switched off for plain-HTTP development.
    pub cookie_secure: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));

        // Sessions
        let session_dir =
            PathBuf::from(env::var("SESSION_DIR").unwrap_or_else(|_| "./data/sessions".to_string()));

        let session_cookie =
            env::var("SESSION_COOKIE").unwrap_or_else(|_| "session_id".to_string());

        // Cookie names travel in headers; restrict to the RFC 6265 token
        // subset we actually need.
        if session_cookie.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SESSION_COOKIE".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        if !session_cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidValue(
                "SESSION_COOKIE".to_string(),
                "may only contain alphanumeric characters, hyphens, and underscores".to_string(),
            ));
        }

        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let cookie_secure = parse_env_or_default("COOKIE_SECURE", true)?;

        Ok(Config {
            bind_addr,
            static_dir,
            session_dir,
            session_cookie,
            session_ttl_secs,
            cookie_secure,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests run serially since they modify global env vars.
    // unwrap_or_else handles poison from prior panics.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_test_env() {
        env::remove_var("BIND_ADDR");
        env::remove_var("STATIC_DIR");
        env::remove_var("SESSION_DIR");
        env::remove_var("SESSION_COOKIE");
        env::remove_var("SESSION_TTL_SECS");
        env::remove_var("COOKIE_SECURE");
    }

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_U64", "12345");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_U64");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 100);
    }

    #[test]
    fn test_config_defaults() {
        let _guard = lock_test();
        clear_test_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.session_dir, PathBuf::from("./data/sessions"));
        assert_eq!(config.session_cookie, "session_id");
        assert_eq!(config.session_ttl_secs, 86_400);
        assert!(config.cookie_secure);

        clear_test_env();
    }

    #[test]
    fn test_invalid_socket_addr() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("BIND_ADDR", "invalid_address");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_empty_cookie_name() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SESSION_COOKIE", "");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_COOKIE"
        ));

        clear_test_env();
    }

    #[test]
    fn test_invalid_cookie_name_special_chars() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SESSION_COOKIE", "session;id");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_COOKIE"
        ));

        clear_test_env();
    }

    #[test]
    fn test_zero_session_ttl_rejected() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SESSION_TTL_SECS", "0");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_TTL_SECS"
        ));

        clear_test_env();
    }

    #[test]
    fn test_cookie_secure_override() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("COOKIE_SECURE", "false");
        let config = Config::from_env().unwrap();
        assert!(!config.cookie_secure);

        env::set_var("COOKIE_SECURE", "not-a-bool");
        let result = Config::from_env();
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }
}
