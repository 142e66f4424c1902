//! Paged collection responses

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::http::HttpHelper;

use super::{Object, Resource};

/// Wire format of a collection page
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default, alias = "prev")]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
}

impl RawPage {
    pub(crate) fn fetch(http: &HttpHelper, uri: &str, params: &Map<String, Value>) -> Result<Self> {
        let value = http.get(uri, params)?.into_json()?;
        Ok(serde_json::from_value(value)?)
    }
}

/// One page of a collection
pub struct ResourcePage<R> {
    http: Arc<HttpHelper>,
    count: u64,
    next: Option<String>,
    previous: Option<String>,
    results: Vec<Object<R>>,
}

impl<R: Resource> fmt::Debug for ResourcePage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePage")
            .field("count", &self.count)
            .field("next", &self.next)
            .field("previous", &self.previous)
            .field("results", &self.results)
            .finish()
    }
}

impl<R: Resource> ResourcePage<R> {
    pub(crate) fn fetch(http: Arc<HttpHelper>, uri: &str, params: &Map<String, Value>) -> Result<Self> {
        let raw = RawPage::fetch(&http, uri, params)?;
        let results = raw
            .results
            .into_iter()
            .map(|value| Object::from_value(Arc::clone(&http), value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            count: raw.count.unwrap_or(results.len() as u64),
            next: raw.next,
            previous: raw.previous,
            results,
            http,
        })
    }

    /// Total number of objects in the collection
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn results(&self) -> &[Object<R>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Object<R>> {
        self.results
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_page(&self) -> Result<Option<Self>> {
        self.follow(self.next.as_deref())
    }

    pub fn previous_page(&self) -> Result<Option<Self>> {
        self.follow(self.previous.as_deref())
    }

    /// Every object of this page and the following ones
    pub fn collect_all(self) -> Result<Vec<Object<R>>> {
        let mut next = self.next.clone();
        let http = Arc::clone(&self.http);
        let mut objects = self.results;
        while let Some(uri) = next.take() {
            let page = Self::fetch(Arc::clone(&http), &uri, &Map::new())?;
            next = page.next;
            objects.extend(page.results);
        }
        Ok(objects)
    }

    fn follow(&self, uri: Option<&str>) -> Result<Option<Self>> {
        uri.map(|uri| Self::fetch(Arc::clone(&self.http), uri, &Map::new()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_page_accepts_prev_alias() {
        let page: RawPage = serde_json::from_value(json!({
            "count": 3,
            "next": null,
            "prev": "http://localhost/v0.7/networks/?offset=0&limit=2",
            "results": [{"id": 1}]
        }))
        .unwrap();
        assert_eq!(page.count, Some(3));
        assert!(page.next.is_none());
        assert!(page.previous.is_some());
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn test_raw_page_defaults() {
        let page: RawPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.results.is_empty());
        assert!(page.count.is_none());
    }
}
