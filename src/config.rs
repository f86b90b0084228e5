use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const LOGIN_ROUTE: &str = "/login";

// Cookie / local store key names
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-client")]
#[command(about = "Command line client for the artist portfolio API")]
pub struct Args {
    // API root, e.g. "https://api.example.com/api"
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    // Local credential store (defaults to ~/.portfolio-client/storage.json)
    #[arg(short, long)]
    pub storage_path: Option<PathBuf>,

    // Like-status cache TTL in seconds
    #[arg(short, long, default_value_t = 300)]
    pub cache_ttl: u64,

    // Max cached batch lookups before the oldest is evicted
    #[arg(long, default_value_t = 100)]
    pub cache_capacity: usize,

    // Max ids sent in one batch lookup
    #[arg(long, default_value_t = 50)]
    pub max_batch: usize,

    // How long an optimistic failure message stays visible
    #[arg(long, default_value_t = 3000)]
    pub error_clear_ms: u64,

    // Request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged in user
    Whoami,
    /// List artists
    Artists {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 8)]
        limit: u32,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// List reviews
    Reviews {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 8)]
        limit: u32,
        #[arg(long)]
        artist: Option<String>,
    },
    /// Toggle the like on a review
    LikeReview { id: String },
    /// Comment on a review
    CommentReview { id: String, text: String },
    /// Batch like status for reviews
    LikeStatus { ids: Vec<String> },
    /// Admin dashboard numbers
    Stats,
    /// Dump client metrics
    Metrics,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
    pub max_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            capacity: 100,
            max_batch: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub storage_path: Option<PathBuf>,
    pub timeout: Duration,
    pub error_clear_delay: Duration,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_path: None,
            timeout: Duration::from_secs(30),
            error_clear_delay: Duration::from_secs(3),
            cache: CacheConfig::default(),
        }
    }
}

impl From<&Args> for ClientConfig {
    fn from(args: &Args) -> Self {
        Self {
            base_url: args.base_url.clone(),
            storage_path: args.storage_path.clone(),
            timeout: Duration::from_secs(args.timeout),
            error_clear_delay: Duration::from_millis(args.error_clear_ms),
            cache: CacheConfig {
                ttl: Duration::from_secs(args.cache_ttl),
                capacity: args.cache_capacity,
                max_batch: args.max_batch,
            },
        }
    }
}

// ~/.portfolio-client/storage.json, or ./.portfolio-client/storage.json without a home dir
pub fn default_storage_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".portfolio-client").join("storage.json")
}
