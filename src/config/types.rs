use serde::Deserialize;

/// Cities crawled when the configuration does not name any
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "indore",
    "mumbai",
    "new-delhi",
    "bangalore",
    "hyderabad",
    "chennai",
    "pune",
    "kolkata",
    "ahmedabad",
    "jaipur",
    "gurgaon",
    "noida",
    "chandigarh",
];

/// Subcategories listed under the Activities tab
pub const DEFAULT_ACTIVITY_SUBCATEGORIES: &[&str] = &[
    "theme-parks",
    "water-parks",
    "adventure",
    "game-zones",
    "kids-play",
    "workshops",
    "games-quizzes",
    "art-craft",
    "fitness",
    "pets",
    "esports",
    "museums",
];

/// Subcategories listed under the Events tab
pub const DEFAULT_EVENT_SUBCATEGORIES: &[&str] = &[
    "music",
    "comedy",
    "nightlife",
    "performances",
    "sports",
    "food-drinks",
    "fests-fairs",
    "social-mixers",
    "screenings",
    "fitness",
    "conferences",
    "expos",
    "art-exhibitions",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Main configuration structure for Event-Sweep
///
/// Every section is optional; a missing key takes the default documented on
/// its field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locations to crawl, in crawl order
    pub locations: Vec<String>,
    pub categories: CategoriesConfig,
    pub crawler: CrawlerConfig,
    pub delivery: DeliveryConfig,
    pub persistence: PersistenceConfig,
    pub scraper: ScraperConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations: to_strings(DEFAULT_LOCATIONS),
            categories: CategoriesConfig::default(),
            crawler: CrawlerConfig::default(),
            delivery: DeliveryConfig::default(),
            persistence: PersistenceConfig::default(),
            scraper: ScraperConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Subcategories per category tab
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    pub activities: Vec<String>,
    pub events: Vec<String>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            activities: to_strings(DEFAULT_ACTIVITY_SUBCATEGORIES),
            events: to_strings(DEFAULT_EVENT_SUBCATEGORIES),
        }
    }
}

/// Crawl orchestration configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of events delivered in one crawl (unset = unlimited)
    pub max_events: Option<usize>,

    /// Number of work units of one category tab in flight at once (default 1)
    pub concurrency: usize,

    /// Pause after every attempted batch delivery, in milliseconds (default 300)
    pub cooldown_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_events: None,
            concurrency: 1,
            cooldown_ms: 300,
        }
    }
}

/// Callback delivery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeliveryConfig {
    /// Attempts per batch, including the first (default 5)
    pub max_retries: u32,

    /// Timeout of a single attempt, in milliseconds (default 15000)
    pub timeout_ms: u64,

    /// Backoff grows by this much per attempt, in milliseconds (default 500)
    pub backoff_base_ms: u64,

    /// Upper bound of a single backoff wait, in milliseconds (default 5000)
    pub backoff_cap_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            timeout_ms: 15_000,
            backoff_base_ms: 500,
            backoff_cap_ms: 5_000,
        }
    }
}

/// Failed batch persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Whether permanently failed batches are written to disk (default false)
    pub enabled: bool,

    /// Directory receiving one JSON file per failed batch
    pub directory: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: "failed_batches".to_string(),
        }
    }
}

/// Settings of the built-in HTTP category scraper
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Timeout for loading a listing page, in milliseconds
    pub listing_timeout_ms: u64,

    /// Maximum number of detail pages visited per listing
    pub max_events_per_category: usize,

    /// Attempts to load a single detail page
    pub page_max_attempts: u32,

    /// Timeout of a single detail page attempt, in milliseconds
    pub page_attempt_timeout_ms: u64,

    /// Consecutive detail page failures after which a listing is abandoned
    pub max_consecutive_failures: u32,

    /// Substring an anchor must contain to count as an event link
    pub link_pattern: String,

    /// User agent sent with every page request
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_timeout_ms: 15_000,
            max_events_per_category: 200,
            page_max_attempts: 3,
            page_attempt_timeout_ms: 10_000,
            max_consecutive_failures: 5,
            link_pattern: "/events/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// HTTP trigger configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the trigger endpoint listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}
