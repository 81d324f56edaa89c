pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod quotes;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod state;

pub use error::{ApiError, LoadError, StartupError};
pub use models::{Pagination, Quote, QuotePage, RandomFilters};
pub use quotes::QuoteRepository;
pub use rate_limit::{Decision, RateLimitConfig, RateLimiter};
pub use routes::build_router;
pub use state::AppState;
