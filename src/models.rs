use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 10;

// A single attributed quotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub lang: String,
    pub author: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

// One page of quotes plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotePage {
    pub data: Vec<Quote>,
    pub pagination: Pagination,
}

// Filters for a random draw, empty list = not supplied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RandomFilters {
    pub authors: Vec<String>,
    pub langs: Vec<String>,
}

impl RandomFilters {
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_langs<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.langs = langs.into_iter().map(Into::into).collect();
        self
    }
}

// Query string as decoded key/value pairs, repeats kept in order
pub type QueryPairs = Vec<(String, String)>;

// Raw `?page=&perPage=` values as they arrived
#[derive(Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageQuery {
    // a repeated page or perPage is ambiguous, so it is rejected
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut query = PageQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "perPage" => &mut query.per_page,
                _ => continue,
            };
            if slot.replace(value.clone()).is_some() {
                return Err(ApiError::bad_request(format!(
                    "Invalid pagination parameters. '{}' was given more than once.",
                    key
                )));
            }
        }
        Ok(query)
    }

    // range checks happen in the repository
    pub fn parse(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest {
            page: parse_count("page", self.page.as_deref(), DEFAULT_PAGE)?,
            per_page: parse_count("perPage", self.per_page.as_deref(), DEFAULT_PER_PAGE)?,
        })
    }
}

fn parse_count(name: &str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<usize>().map_err(|_| {
            ApiError::bad_request(format!(
                "Invalid pagination parameters. '{}' must be a positive integer, got '{}'.",
                name, value
            ))
        }),
    }
}

// Raw `?author=&lang=` values; both are comma-separated lists
#[derive(Debug, Default)]
pub struct RandomQuery {
    pub author: Option<String>,
    pub lang: Option<String>,
}

impl RandomQuery {
    // repeated author/lang values join into one comma list
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut query = RandomQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "author" => &mut query.author,
                "lang" => &mut query.lang,
                _ => continue,
            };
            *slot = Some(match slot.take() {
                Some(joined) => format!("{},{}", joined, value),
                None => value.clone(),
            });
        }
        query
    }

    pub fn filters(&self) -> RandomFilters {
        RandomFilters {
            authors: split_list(self.author.as_deref()),
            langs: split_list(self.lang.as_deref()),
        }
    }
}

// an absent or empty parameter is no filter; blank items are kept
fn split_list(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(value) => value.split(',').map(|item| item.trim().to_string()).collect(),
    }
}

pub fn parse_quote_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| ApiError::invalid_id())
}
