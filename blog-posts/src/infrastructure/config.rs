use crate::domain::pager::DEFAULT_ITEMS_PER_PAGE;
use crate::infrastructure::logging::LogFormat;

pub const DEFAULT_RELATED_POSTS: usize = 3;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub items_per_page: usize,
    pub related_posts: usize,
    pub max_connections: u32,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let items_per_page = parse_var("ITEMS_PER_PAGE", DEFAULT_ITEMS_PER_PAGE)?;
        let related_posts = parse_var("RELATED_POSTS", DEFAULT_RELATED_POSTS)?;
        let max_connections = parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let log_format = std::env::var("LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            items_per_page,
            related_posts,
            max_connections,
            log_format,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let value: usize = parse_var("BLOG_POSTS_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
