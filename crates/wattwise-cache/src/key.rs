//! Outbound request identity and the cache keys derived from it.

use reqwest::Method;
use sha2::{Digest, Sha256};

/// Query parameter names whose values are never written to logs.
const REDACTED_PARAMS: &[&str] = &["key", "api_key", "apikey", "token"];

/// An outbound provider request, described by the parts that make it unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Append a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Deterministic key for this request.
    ///
    /// The method is case-normalized and parameters are sorted by name then
    /// value, so logically identical requests share a key in every process.
    /// Every part is length-prefixed before hashing, so no value can be read
    /// back as a different split of names and values.
    pub fn cache_key(&self) -> String {
        let mut params: Vec<&(String, String)> = self.params.iter().collect();
        params.sort();

        let mut hasher = Sha256::new();
        let method = self.method.as_str().to_ascii_uppercase();
        hash_part(&mut hasher, method.as_bytes());
        hash_part(&mut hasher, self.url.trim_end_matches('?').as_bytes());
        hasher.update((params.len() as u64).to_le_bytes());
        for (name, value) in params {
            hash_part(&mut hasher, name.as_bytes());
            hash_part(&mut hasher, value.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Printable form with credentials masked.
    pub fn redacted(&self) -> String {
        if self.params.is_empty() {
            return format!("{} {}", self.method, self.url);
        }
        let query = self
            .params
            .iter()
            .map(|(name, value)| {
                if REDACTED_PARAMS.contains(&name.to_ascii_lowercase().as_str()) {
                    format!("{}=***", name)
                } else {
                    format!("{}={}", name, value)
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{} {}?{}", self.method, self.url, query)
    }

    pub(crate) fn to_request(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        client
            .request(self.method.clone(), &self.url)
            .query(&self.params)
    }
}

fn hash_part(hasher: &mut Sha256, part: &[u8]) {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part);
}
