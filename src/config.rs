use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// `None` means outbound mail is only logged.
    pub smtp: Option<SmtpConfig>,
    pub default_from_email: String,
    pub public_base_url: String,
}

impl Config {
    /// Reads configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a local `.env`.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mailora_campaigns.db".into());
        let port = parse_var("PORT", 3030)?;

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host: host.trim().to_string(),
                port: parse_var("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
            }),
            _ => None,
        };
        if let Some(smtp) = &smtp {
            if smtp.username.is_some() != smtp.password.is_some() {
                anyhow::bail!("SMTP_USERNAME and SMTP_PASSWORD must be set together");
            }
        }

        let default_from_email =
            env::var("DEFAULT_FROM_EMAIL").unwrap_or_else(|_| "no-reply@localhost".into());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            database_url,
            port,
            smtp,
            default_from_email,
            public_base_url,
        })
    }
}

fn parse_var(name: &str, default: u16) -> Result<u16> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a port number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-wide environment is never mutated concurrently.
    #[test]
    fn reads_environment_with_defaults() {
        for key in [
            "DATABASE_URL",
            "PORT",
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_USERNAME",
            "SMTP_PASSWORD",
            "DEFAULT_FROM_EMAIL",
            "PUBLIC_BASE_URL",
        ] {
            env::remove_var(key);
        }

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.database_url, "sqlite://mailora_campaigns.db");
        assert_eq!(cfg.port, 3030);
        assert!(cfg.smtp.is_none());
        assert_eq!(cfg.public_base_url, "http://localhost:3030");

        env::set_var("SMTP_HOST", "smtp.example.com");
        env::set_var("SMTP_PORT", "465");
        env::set_var("PUBLIC_BASE_URL", "https://mail.example.com/");
        let cfg = Config::from_env().unwrap();
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 465);
        assert_eq!(cfg.public_base_url, "https://mail.example.com");

        env::set_var("SMTP_USERNAME", "only-user");
        assert!(Config::from_env().is_err());
        env::remove_var("SMTP_USERNAME");

        env::set_var("PORT", "not-a-port");
        assert!(Config::from_env().is_err());

        for key in ["SMTP_HOST", "SMTP_PORT", "PUBLIC_BASE_URL", "PORT"] {
            env::remove_var(key);
        }
    }
}
