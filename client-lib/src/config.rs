use ::envconfig::Envconfig;

#[derive(::envconfig::Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "REVIEW_API_URL", default = "http://localhost:8080")]
    pub api_url: String,

    // When unset the session token only lives in memory.
    #[envconfig(from = "REVIEW_TOKEN_PATH")]
    pub token_path: Option<String>,

    #[envconfig(from = "REQUEST_TIMEOUT_SECONDS", default = "30")]
    pub request_timeout_seconds: u64,

    #[envconfig(from = "REVIEW_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Config {
    pub fn from_env() -> ::anyhow::Result<Config> {
        Ok(Config::init_from_env()?)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!("review-client-{}", env!("CARGO_PKG_VERSION"))
        })
    }

    pub fn request_timeout(&self) -> ::std::time::Duration {
        ::std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}
