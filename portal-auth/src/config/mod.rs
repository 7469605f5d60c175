use portal_core::config as core_config;
use portal_core::error::AppError;
use serde::Deserialize;
use std::env;

use crate::models::Role;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub oauth: OAuthConfig,
    pub registration: RegistrationConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// LinuxDo OAuth2 provider settings.
///
/// `enabled == false` is an administrative choice and surfaces as a policy
/// rejection; an enabled provider with missing client credentials is an
/// operator error and surfaces as a configuration fault.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub enabled: bool,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_info_url: String,
    /// Callback address registered with the provider. When unset the
    /// callback is derived from the inbound request's proxy headers.
    pub redirect_uri: Option<String>,
    pub min_trust_level: u8,
    pub auto_register: bool,
    pub default_role: Role,
}

#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub enabled: bool,
    pub require_approval: bool,
    pub max_users: Option<u64>,
    /// The site owner's login name; direct registrations may not claim it.
    pub owner_username: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Secret for signing auth credentials. Absent means credentials are
    /// issued unsigned (lower-trust mode).
    pub auth_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("portal-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            oauth: OAuthConfig {
                enabled: get_env("OAUTH_ENABLED", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
                client_id: get_env("OAUTH_CLIENT_ID", Some(""), is_prod)?,
                client_secret: get_env("OAUTH_CLIENT_SECRET", Some(""), is_prod)?,
                authorize_url: get_env(
                    "OAUTH_AUTHORIZE_URL",
                    Some("https://connect.linux.do/oauth2/authorize"),
                    is_prod,
                )?,
                token_url: get_env(
                    "OAUTH_TOKEN_URL",
                    Some("https://connect.linux.do/oauth2/token"),
                    is_prod,
                )?,
                user_info_url: get_env(
                    "OAUTH_USER_INFO_URL",
                    Some("https://connect.linux.do/api/user"),
                    is_prod,
                )?,
                redirect_uri: env::var("OAUTH_REDIRECT_URI").ok().filter(|v| !v.is_empty()),
                min_trust_level: get_env("OAUTH_MIN_TRUST_LEVEL", Some("0"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                auto_register: get_env("OAUTH_AUTO_REGISTER", Some("true"), is_prod)?
                    .parse()
                    .unwrap_or(true),
                default_role: get_env("OAUTH_DEFAULT_ROLE", Some("user"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            registration: RegistrationConfig {
                enabled: get_env("REGISTRATION_ENABLED", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
                require_approval: get_env("REGISTRATION_APPROVAL", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
                max_users: match env::var("MAX_USERS") {
                    Ok(val) if !val.is_empty() => Some(val.parse().map_err(
                        |e: std::num::ParseIntError| {
                            AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                        },
                    )?),
                    _ => None,
                },
                owner_username: get_env("OWNER_USERNAME", Some("admin"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                auth_secret: env::var("AUTH_SECRET").ok().filter(|v| !v.is_empty()),
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("true"), is_prod)?
                    .parse()
                    .unwrap_or(true),
            },
            rate_limit: RateLimitConfig {
                register_attempts: get_env("RATE_LIMIT_REGISTER_ATTEMPTS", Some("3"), is_prod)?
                    .parse()
                    .unwrap_or(3),
                register_window_seconds: get_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3600),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "APP__PORT must be greater than 0"
            )));
        }

        if self.registration.max_users == Some(0) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAX_USERS must be greater than 0 when set"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.security.auth_secret.is_none() {
                tracing::warn!(
                    "AUTH_SECRET is not set - auth credentials will be issued unsigned"
                );
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
