use clap::Parser;

/// Server configuration. Every flag can also come from the environment
/// (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "items-backend")]
#[command(about = "CRUD service for items")]
pub struct Config {
    /// SQLite database file (or `:memory:`)
    #[arg(long, env = "DATABASE_URL", default_value = "items.db")]
    pub database_url: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum number of pooled database connections
    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,

    /// Upper bound applied to the `limit` query parameter of `GET /items`
    #[arg(
        long,
        env = "MAX_LIST_LIMIT",
        default_value_t = 1000,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub max_list_limit: i64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
