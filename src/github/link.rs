//! Structured `Link` header parsing.
//!
//! GitHub paginates with an RFC 8288 style header:
//! `<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=9>; rel="last"`.
//! The header is parsed once into [`LinkHeader`] so callers ask for a relation
//! by name instead of slicing strings.

use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Errors raised for a `Link` header that does not follow the expected format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("link entry '{0}' is missing a <url> target")]
    MissingTarget(String),
    #[error("link entry '{0}' is missing a rel parameter")]
    MissingRel(String),
    #[error("link target '{url}' is not a valid URL: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("relation '{rel}' has no page parameter")]
    MissingPage { rel: String },
    #[error("relation '{rel}' has a non-numeric page '{value}'")]
    InvalidPage { rel: String, value: String },
}

/// One `<url>; rel="name"` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    pub rel: String,
    pub url: Url,
}

/// Every relation carried by a response, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkHeader {
    relations: Vec<LinkRelation>,
}

impl LinkHeader {
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// URL of the first relation named `rel`.
    pub fn get(&self, rel: &str) -> Option<&Url> {
        self.relations
            .iter()
            .find(|relation| relation.rel == rel)
            .map(|relation| &relation.url)
    }

    /// Page number carried by the `rel` relation.
    ///
    /// `Ok(None)` when the relation is absent; an error when it is present but
    /// its URL has no usable `page` query parameter.
    pub fn page_of(&self, rel: &str) -> Result<Option<u64>, LinkError> {
        let Some(url) = self.get(rel) else {
            return Ok(None);
        };

        let value = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| LinkError::MissingPage {
                rel: rel.to_string(),
            })?;

        value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| LinkError::InvalidPage {
                rel: rel.to_string(),
                value,
            })
    }
}

impl FromStr for LinkHeader {
    type Err = LinkError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut relations = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.split(';').map(str::trim);

            let target = parts
                .next()
                .and_then(|part| part.strip_prefix('<'))
                .and_then(|part| part.strip_suffix('>'))
                .ok_or_else(|| LinkError::MissingTarget(entry.to_string()))?;

            let url = Url::parse(target).map_err(|err| LinkError::InvalidUrl {
                url: target.to_string(),
                reason: err.to_string(),
            })?;

            let rels: Vec<&str> = parts
                .filter_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("rel")
                        .then(|| value.trim().trim_matches('"'))
                })
                .collect();

            if rels.is_empty() {
                return Err(LinkError::MissingRel(entry.to_string()));
            }

            // rel="next last" names two relations for the same target
            for rel in rels.iter().flat_map(|value| value.split_whitespace()) {
                relations.push(LinkRelation {
                    rel: rel.to_ascii_lowercase(),
                    url: url.clone(),
                });
            }
        }

        Ok(Self { relations })
    }
}
