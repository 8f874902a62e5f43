use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upstream: UpstreamConfig,
    /// Deadline for a whole API request; in-flight upstream calls are dropped when it elapses.
    pub request_timeout: Duration,
}

/// Everything the normalization facade needs to reach the cafeteria's endpoints.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub menu_url: String,
    pub data_url: String,
    pub servings_url: String,
    pub image_base_url: String,
    pub timeout: Duration,
    pub user_fetch_concurrency: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            menu_url: "https://www.unc.edu.ar/vida-estudiantil/men%C3%BA-de-la-semana".into(),
            data_url: "http://comedor.unc.edu.ar/gv-ds.php".into(),
            servings_url: "http://comedor.unc.edu.ar/gv-ds.php?json=true&accion=1&sede=0475".into(),
            image_base_url: "https://asiruws.unc.edu.ar/foto/".into(),
            timeout: Duration::from_secs(10),
            user_fetch_concurrency: 8,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = UpstreamConfig::default();

        let user_fetch_concurrency: usize = env::var("USER_FETCH_CONCURRENCY")
            .unwrap_or_else(|_| defaults.user_fetch_concurrency.to_string())
            .parse()?;
        if user_fetch_concurrency == 0 {
            return Err(anyhow::anyhow!("USER_FETCH_CONCURRENCY must be at least 1"));
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            upstream: UpstreamConfig {
                menu_url: env::var("MENU_URL").unwrap_or(defaults.menu_url),
                data_url: env::var("DATA_URL").unwrap_or(defaults.data_url),
                servings_url: env::var("SERVINGS_URL").unwrap_or(defaults.servings_url),
                image_base_url: env::var("IMAGE_BASE_URL").unwrap_or(defaults.image_base_url),
                timeout: Duration::from_secs(
                    env::var("UPSTREAM_TIMEOUT_SECS")
                        .unwrap_or_else(|_| "10".into())
                        .parse()?,
                ),
                user_fetch_concurrency,
            },
            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "25".into())
                    .parse()?,
            ),
        })
    }
}
