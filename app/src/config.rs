use std::{ops::Deref, sync::Arc};

pub struct ConfigInner {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub oracle_base_url: String,
}

#[derive(Clone)]
pub struct Config(Arc<ConfigInner>);

impl Config {
    pub fn from_env() -> Config {
        dotenvy::dotenv().ok();
        let v = ConfigInner {
            host: std::env::var("HOST").expect("HOST is not set in .env file"),
            port: std::env::var("PORT")
                .expect("PORT is not set in .env file")
                .parse()
                .expect("PORT is not a number"),
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .expect("ALLOWED_ORIGIN is not set in .env file"),
            oracle_base_url: std::env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://codeforces.com/api".to_owned()),
        };

        Self(Arc::new(v))
    }

    pub fn new(inner: ConfigInner) -> Config {
        Self(Arc::new(inner))
    }

    pub fn get_server_url(&self) -> String {
        format!("{}:{}", self.0.host, self.0.port)
    }
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
