//! Memoizing HTTP client for the course catalogue API.

use super::{
    module_level, normalize_code, validate_acad_year, CatalogueEntry, CatalogueIndex,
    ModuleSummary, SemesterData,
};
use crate::config::CatalogueSettings;
use crate::error::{ModplanError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use url::Url;

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Client for the versioned catalogue API with per-instance caching.
///
/// Entries are cached per `(academic year, module code)` and never evicted, so
/// a long-lived client keeps serving the data it first saw. Each cache slot is
/// filled at most once: concurrent first requests for the same key share one
/// fetch, and a failed fetch drops the slot so the next caller starts afresh.
pub struct CatalogueClient {
    http: reqwest::Client,
    base_url: Url,
    default_year: String,
    entries: Mutex<HashMap<(String, String), Slot<CatalogueEntry>>>,
    indexes: Mutex<HashMap<String, Slot<CatalogueIndex>>>,
}

impl CatalogueClient {
    /// Create a client from catalogue settings.
    pub fn new(settings: &CatalogueSettings) -> Result<Self> {
        validate_acad_year(&settings.acad_year)
            .map_err(|e| ModplanError::Config(format!("catalogue.acad_year: {}", e)))?;

        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = settings.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            ModplanError::Config(format!("Invalid catalogue base URL '{}': {}", settings.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            default_year: settings.acad_year.clone(),
            entries: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
        })
    }

    /// Academic year used when callers do not name one.
    pub fn default_year(&self) -> &str {
        &self.default_year
    }

    /// Number of module records currently cached.
    pub fn cached_entry_count(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.initialized()).count()
    }

    /// Fetch a module record, serving it from cache when possible.
    #[instrument(skip(self))]
    pub async fn get_entry(&self, identifier: &str, year: Option<&str>) -> Result<Arc<CatalogueEntry>> {
        let code = normalize_code(identifier)?;
        let year = self.resolve_year(year)?;

        let key = (year.clone(), code.clone());
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(key.clone()).or_default().clone()
        };

        if let Some(entry) = slot.get() {
            debug!("Cache hit for {}:{}", year, code);
            return Ok(entry.clone());
        }

        let entry = slot
            .get_or_try_init(|| async {
                let url = self.endpoint(&format!("{}/modules/{}.json", year, code))?;
                let entry: CatalogueEntry = self
                    .fetch_json(url, || {
                        ModplanError::NotFound(format!("{} in academic year {}", code, year))
                    })
                    .await?;
                Ok::<_, ModplanError>(Arc::new(entry))
            })
            .await;

        match entry {
            Ok(entry) => Ok(entry.clone()),
            Err(e) => {
                evict_empty(&self.entries, &key, &slot);
                Err(e)
            }
        }
    }

    /// Fetch the full module list for a year. Later calls reuse the cached list.
    #[instrument(skip(self))]
    pub async fn list_catalogue(&self, year: Option<&str>) -> Result<Arc<CatalogueIndex>> {
        let year = self.resolve_year(year)?;

        let slot = {
            let mut indexes = self.indexes.lock().unwrap_or_else(PoisonError::into_inner);
            indexes.entry(year.clone()).or_default().clone()
        };

        let index = slot
            .get_or_try_init(|| async {
                let url = self.endpoint(&format!("{}/moduleList.json", year))?;
                let index: CatalogueIndex = self
                    .fetch_json(url, || {
                        ModplanError::NotFound(format!("No catalogue for academic year {}", year))
                    })
                    .await?;
                info!("Loaded {} modules for {}", index.len(), year);
                Ok::<_, ModplanError>(Arc::new(index))
            })
            .await;

        match index {
            Ok(index) => Ok(index.clone()),
            Err(e) => {
                evict_empty(&self.indexes, &year, &slot);
                Err(e)
            }
        }
    }

    /// Case-insensitive keyword search over module codes and titles.
    ///
    /// Results keep catalogue order and are truncated to `limit`; there is no
    /// relevance ranking.
    pub async fn search_entries(
        &self,
        query: &str,
        year: Option<&str>,
        level: Option<u8>,
        limit: usize,
    ) -> Result<Vec<ModuleSummary>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ModplanError::Validation(
                "query must be a non-empty string".to_string(),
            ));
        }

        let index = self.list_catalogue(year).await?;

        let matches = index
            .iter()
            .filter(|m| match level {
                Some(level) => module_level(&m.module_code) == Some(level),
                None => true,
            })
            .filter(|m| {
                m.module_code.to_lowercase().contains(&needle)
                    || m.title.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();

        debug!("Search '{}' matched {} modules", needle, matches.len());
        Ok(matches)
    }

    /// Semester offerings for a module, optionally restricted to one semester.
    pub async fn get_schedule(
        &self,
        identifier: &str,
        year: Option<&str>,
        semester: Option<u8>,
    ) -> Result<Vec<SemesterData>> {
        let entry = self.get_entry(identifier, year).await?;

        Ok(entry
            .semester_data
            .iter()
            .filter(|s| semester.map_or(true, |wanted| s.semester == wanted))
            .cloned()
            .collect())
    }

    fn resolve_year(&self, year: Option<&str>) -> Result<String> {
        match year.map(str::trim).filter(|y| !y.is_empty()) {
            Some(year) => {
                validate_acad_year(year)?;
                Ok(year.to_string())
            }
            None => Ok(self.default_year.clone()),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ModplanError::Validation(format!("Invalid catalogue path '{}': {}", path, e)))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        not_found: impl FnOnce() -> ModplanError,
    ) -> Result<T> {
        info!("Fetching catalogue data: {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ModplanError::TransientFetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            return Err(ModplanError::TransientFetch(format!(
                "{} returned {}",
                url, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ModplanError::TransientFetch(format!("Invalid response from {}: {}", url, e)))
    }
}

/// Drop a slot left unfilled by a failed fetch, unless another caller has
/// since replaced or filled it.
fn evict_empty<K: Eq + Hash, T>(map: &Mutex<HashMap<K, Slot<T>>>, key: &K, slot: &Slot<T>) {
    let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
    if map
        .get(key)
        .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized())
    {
        map.remove(key);
    }
}
