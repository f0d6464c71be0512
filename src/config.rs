use crate::controller::Layout;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ANALYZE_URL: &str = "http://localhost:6047/analyze";

/// Runtime settings for the page host and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Interface the web binary binds to.
    pub host: String,

    pub port: u16,

    /// Full URL of the analysis backend's `/analyze` endpoint.
    pub analyze_url: String,

    pub layout: Layout,

    /// actix worker count.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            analyze_url: DEFAULT_ANALYZE_URL.to_string(),
            layout: Layout::default(),
            workers: num_cpus::get(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `HOST`, `PORT`, `ANALYZE_URL`, `LAYOUT` and `WORKERS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable lookup. Unparseable
    /// values are logged and ignored.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(p) => config.port = p,
                Err(_) => log::warn!("Ignoring invalid PORT value {:?}", port),
            }
        }
        if let Some(url) = lookup("ANALYZE_URL") {
            config.analyze_url = url;
        }
        if let Some(layout) = lookup("LAYOUT") {
            match layout.parse() {
                Ok(l) => config.layout = l,
                Err(e) => log::warn!("Ignoring LAYOUT: {}", e),
            }
        }
        if let Some(workers) = lookup("WORKERS") {
            match workers.parse::<usize>() {
                Ok(w) if w > 0 => config.workers = w,
                _ => log::warn!("Ignoring invalid WORKERS value {:?}", workers),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_ANALYZE_URL, DEFAULT_PORT};
    use crate::controller::Layout;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.analyze_url, DEFAULT_ANALYZE_URL);
        assert_eq!(config.layout, Layout::Modal);
        assert!(config.workers > 0);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("ANALYZE_URL", "http://analyzer:6047/analyze"),
            ("LAYOUT", "accordion"),
            ("WORKERS", "2"),
        ]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.analyze_url, "http://analyzer:6047/analyze");
        assert_eq!(config.layout, Layout::Accordion);
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "eighty"),
            ("LAYOUT", "grid"),
            ("WORKERS", "0"),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.layout, Layout::Modal);
        assert!(config.workers > 0);
    }
}
