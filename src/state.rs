use std::sync::Arc;
use crate::quotes::QuoteRepository;
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub quotes: QuoteRepository,        // read-only after startup
    pub rate_limiter: Arc<RateLimiter>, // shared with the sweeper task
}
