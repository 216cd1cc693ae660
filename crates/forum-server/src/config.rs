use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("FORUM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("FORUM_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("FORUM_PORT must be a port number")?;
        let db_path: PathBuf = lookup("FORUM_DB_PATH")
            .unwrap_or_else(|| "forum.db".into())
            .into();
        // React dev server
        let cors_origins = lookup("FORUM_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host,
            port,
            db_path,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("forum.db"));
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn origins_are_comma_separated() {
        let config = config(&[("FORUM_CORS_ORIGINS", "http://a.test, http://b.test,")]).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn host_may_be_a_name() {
        let config = config(&[("FORUM_HOST", "localhost"), ("FORUM_PORT", "9000")]).unwrap();
        assert_eq!((config.host.as_str(), config.port), ("localhost", 9000));
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("FORUM_PORT", "eighty")]).is_err());
    }
}
