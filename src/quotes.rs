use rand::Rng;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ApiError, LoadError};
use crate::models::{Pagination, Quote, QuotePage, RandomFilters};

pub const DEFAULT_MAX_PER_PAGE: usize = 100;

// Collection shipped inside the binary
static BUNDLED_QUOTES: &str = include_str!("../data/quotes.json");

// Read-only quote collection, never mutated after load
#[derive(Debug)]
pub struct QuoteRepository {
    quotes: Vec<Quote>,
    by_id: HashMap<i64, usize>, // id -> position in `quotes`
    max_per_page: usize,
}

impl QuoteRepository {
    // ids must be unique
    pub fn new(quotes: Vec<Quote>) -> Result<Self, LoadError> {
        let mut by_id = HashMap::with_capacity(quotes.len());
        for (pos, quote) in quotes.iter().enumerate() {
            if by_id.insert(quote.id, pos).is_some() {
                return Err(LoadError::DuplicateId(quote.id));
            }
        }

        Ok(Self {
            quotes,
            by_id,
            max_per_page: DEFAULT_MAX_PER_PAGE,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        Self::new(serde_json::from_str(raw)?)
    }

    pub fn bundled() -> Result<Self, LoadError> {
        Self::from_json(BUNDLED_QUOTES)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn with_max_per_page(mut self, max_per_page: usize) -> Self {
        self.max_per_page = max_per_page;
        self
    }

    pub fn max_per_page(&self) -> usize {
        self.max_per_page
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    // Every quote, in load order
    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get_by_id(&self, id: i64) -> Option<&Quote> {
        self.by_id.get(&id).map(|&pos| &self.quotes[pos])
    }

    // owned copy of [(page - 1) * per_page, page * per_page)
    pub fn page(&self, page: usize, per_page: usize) -> Result<QuotePage, ApiError> {
        if page < 1 || per_page < 1 || per_page > self.max_per_page {
            return Err(ApiError::bad_request(format!(
                "Invalid pagination parameters. Page number must be at least 1, and quotes per page must be between 1 and {}.",
                self.max_per_page
            )));
        }

        let total = self.quotes.len();
        let total_pages = total.div_ceil(per_page);

        if page > total_pages && total > 0 {
            return Err(ApiError::OutOfRange { page, total_pages });
        }

        let start = (page - 1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);

        Ok(QuotePage {
            data: self.quotes[start..end].to_vec(),
            pagination: Pagination {
                total,
                page,
                per_page,
                total_pages,
            },
        })
    }

    // Quotes satisfying every supplied filter, in load order
    pub fn matching(&self, filters: &RandomFilters) -> Vec<&Quote> {
        let authors = normalize(&filters.authors);
        let langs = normalize(&filters.langs);

        self.quotes
            .iter()
            .filter(|quote| {
                let author_ok = authors.is_empty() || {
                    let author = quote.author.to_lowercase();
                    authors.iter().any(|a| author.contains(a.as_str()))
                };
                let lang_ok = langs.is_empty() || {
                    let lang = quote.lang.to_lowercase();
                    langs.iter().any(|l| *l == lang)
                };
                author_ok && lang_ok
            })
            .collect()
    }

    pub fn random(&self, filters: &RandomFilters) -> Option<&Quote> {
        self.random_with(filters, &mut rand::rng())
    }

    pub fn random_with<R: Rng>(&self, filters: &RandomFilters, rng: &mut R) -> Option<&Quote> {
        let candidates = self.matching(filters);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

// Trim and lowercase. A blank lang matches nothing, a blank author everything.
fn normalize(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim().to_lowercase())
        .collect()
}
