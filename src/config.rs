use clap::Parser;
use std::time::Duration;

use crate::auth::InMemoryCredentials;
use crate::error::ConfigError;
use crate::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, LimiterConfig};

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "notify-gate")]
#[command(about = "Admission control front for the notify API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Rate limit max requests per window, falls back to 100
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS")]
    pub rate_limit: Option<String>,

    // Rate limit window in minutes, falls back to 5
    #[arg(long, env = "RATE_LIMIT_DURATION")]
    pub rate_window: Option<String>,

    // HMAC key used to sign bearer tokens
    #[arg(long, env = "JWT_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    // Token lifetime in seconds
    #[arg(long, env = "JWT_TOKEN_TTL", default_value_t = 3600)]
    pub token_ttl: u64,

    // Seed credentials, "email:password:id" (comma-separated in env)
    #[arg(long = "user", env = "NOTIFY_USERS", value_delimiter = ',')]
    pub users: Vec<String>,
}

// Settings derived from `Args`, fixed for the life of the process
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub limiter: LimiterConfig,
    pub secret: Vec<u8>,
    pub token_ttl: Duration,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if args.token_ttl == 0 {
            return Err(ConfigError::InvalidTtl);
        }

        let max_requests = parse_positive("rate_limit", args.rate_limit.as_deref())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, fallback = DEFAULT_MAX_REQUESTS, "using default rate limit");
                DEFAULT_MAX_REQUESTS
            });
        let window = parse_positive("rate_window", args.rate_window.as_deref())
            .map(|minutes| Duration::from_secs(u64::from(minutes) * 60))
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, fallback_secs = DEFAULT_WINDOW.as_secs(), "using default rate window");
                DEFAULT_WINDOW
            });

        Ok(Self {
            port: args.port,
            limiter: LimiterConfig {
                max_requests,
                window,
            },
            secret: args.jwt_secret.as_bytes().to_vec(),
            token_ttl: Duration::from_secs(args.token_ttl),
        })
    }
}

// Seed users for the credential directory
pub fn credentials_from_args(args: &Args) -> Result<InMemoryCredentials, ConfigError> {
    let mut store = InMemoryCredentials::default();
    for raw in args.users.iter().filter(|u| !u.trim().is_empty()) {
        // password may itself contain ':' so split from both ends
        let (email, rest) = raw
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidUser(raw.clone()))?;
        let (password, id) = rest
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidUser(raw.clone()))?;
        let id = id
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidUser(raw.clone()))?;
        store
            .insert(email.trim(), password, id)
            .map_err(|_| ConfigError::InvalidUser(raw.clone()))?;
    }
    Ok(store)
}

fn parse_positive(name: &'static str, raw: Option<&str>) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name,
        value: raw.unwrap_or_default().to_string(),
    };
    let value: u32 = raw.ok_or_else(invalid)?.trim().parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["notify-gate", "--jwt-secret", "s3cret"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn limiter_values_from_flags() {
        let settings =
            Settings::from_args(&args(&["--rate-limit", "2", "--rate-window", "1"])).unwrap();
        assert_eq!(settings.limiter.max_requests, 2);
        assert_eq!(settings.limiter.window, Duration::from_secs(60));
        assert_eq!(settings.secret, b"s3cret");
    }

    #[test]
    fn invalid_limiter_values_fall_back() {
        for (limit, window) in [("abc", "-1"), ("0", "0"), ("", "1.5")] {
            let mut a = args(&[]);
            a.rate_limit = Some(limit.to_string());
            a.rate_window = Some(window.to_string());
            let settings = Settings::from_args(&a).unwrap();
            assert_eq!(settings.limiter, LimiterConfig::default());
        }
    }

    #[test]
    fn unset_limiter_values_fall_back() {
        let mut a = args(&[]);
        a.rate_limit = None;
        a.rate_window = None;
        assert_eq!(
            Settings::from_args(&a).unwrap().limiter,
            LimiterConfig::default()
        );
    }

    #[test]
    fn empty_secret_is_fatal() {
        let mut a = args(&[]);
        a.jwt_secret.clear();
        assert!(matches!(
            Settings::from_args(&a),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn zero_ttl_is_fatal() {
        let mut a = args(&[]);
        a.token_ttl = 0;
        assert!(matches!(Settings::from_args(&a), Err(ConfigError::InvalidTtl)));
    }

    #[test]
    fn parse_positive_rejects_garbage() {
        assert_eq!(parse_positive("x", Some(" 7 ")).unwrap(), 7);
        assert!(matches!(
            parse_positive("x", Some("seven")),
            Err(ConfigError::Invalid { name: "x", .. })
        ));
        assert!(parse_positive("x", None).is_err());
    }

    #[test]
    fn seed_users() {
        let mut a = args(&[]);
        a.users = vec!["ada@example.com:pa:ss:7".to_string()];
        let store = credentials_from_args(&a).unwrap();
        assert_eq!(store.len(), 1);

        a.users = vec!["no-id-here".to_string()];
        assert!(matches!(
            credentials_from_args(&a),
            Err(ConfigError::InvalidUser(_))
        ));
    }
}
