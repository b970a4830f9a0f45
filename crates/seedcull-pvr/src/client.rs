//! Radarr/Sonarr API v3 client.
//!
//! History and queue are paginated server-side; both are exposed as lazy
//! streams that request page `N + 1` only once page `N` has been consumed,
//! so a consumer that stops early never over-fetches.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{PvrError, PvrResult};
use crate::model::{EventKind, GroupKey, HistoryEvent, PvrKind, QueueItem};
use crate::service::{EventStream, Pvr};

const HEADER_API_KEY: &str = "X-Api-Key";
const PAGE_SIZE: u32 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one configured PVR instance.
#[derive(Debug, Clone)]
pub struct PvrClient {
    name: String,
    kind: PvrKind,
    base_url: Url,
    api_key: String,
    http: Client,
}

impl PvrClient {
    /// Build a client for the PVR reachable at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PvrError::InvalidUrl`] when `url` does not parse and
    /// [`PvrError::Http`] when the HTTP client cannot be constructed.
    pub fn new(
        name: impl Into<String>,
        kind: PvrKind,
        url: &str,
        api_key: impl Into<String>,
    ) -> PvrResult<Self> {
        let mut base_url = Url::parse(url).map_err(|source| PvrError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| PvrError::Http {
                operation: "client.build",
                source,
            })?;
        Ok(Self {
            name: name.into(),
            kind,
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    /// Flavour of this PVR.
    #[must_use]
    pub const fn kind(&self) -> PvrKind {
        self.kind
    }

    fn endpoint(&self, path: &str) -> PvrResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| PvrError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
    ) -> PvrResult<reqwest::Response> {
        let response = self
            .http
            .request(method, url)
            .header(HEADER_API_KEY, &self.api_key)
            .send()
            .await
            .map_err(|source| PvrError::Http { operation, source })?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(PvrError::HttpStatus {
                operation,
                status: status.as_u16(),
            })
        }
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &'static str,
        extra: &'static [(&'static str, &'static str)],
        page: u32,
    ) -> PvrResult<Page<T>> {
        let mut url = self.endpoint(path)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("pageSize", &PAGE_SIZE.to_string());
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        debug!(pvr = %self.name, operation, page, "fetching page");
        let bytes = self
            .send(operation, Method::GET, url)
            .await?
            .bytes()
            .await
            .map_err(|source| PvrError::Http { operation, source })?;
        serde_json::from_slice(&bytes).map_err(|source| PvrError::Decode { operation, source })
    }

    /// Lazily walk every page of a paginated endpoint, one record at a time.
    fn records<T>(
        &self,
        operation: &'static str,
        path: &'static str,
        extra: &'static [(&'static str, &'static str)],
    ) -> BoxStream<'_, PvrResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let start = Some(Cursor {
            page: 1,
            fetched: 0,
        });
        stream::try_unfold(start, move |cursor| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            let page: Page<T> = self.fetch_page(operation, path, extra, cursor.page).await?;
            if page.records.is_empty() {
                return Ok(None);
            }
            let mut fetched = cursor.fetched;
            if fetched == 0 && page.page > 1 {
                fetched = u64::from(page.page_size) * u64::from(page.page - 1);
            }
            fetched += u64::try_from(page.records.len()).unwrap_or(u64::MAX);
            let next = (fetched < page.total_records).then_some(Cursor {
                page: page.page + 1,
                fetched,
            });
            Ok(Some((page.records, next)))
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<T, PvrError>)))
        .try_flatten()
        .boxed()
    }
}

#[async_trait]
impl Pvr for PvrClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn history_events(&self) -> EventStream<'_> {
        let kind = self.kind;
        self.records::<HistoryRecord>(
            "history.list",
            "api/v3/history",
            &[("sortKey", "date"), ("sortDirection", "descending")],
        )
        .try_filter_map(move |record| future::ready(Ok(record.into_event(kind))))
        .boxed()
    }

    async fn queue(&self) -> PvrResult<Vec<QueueItem>> {
        self.records::<QueueRecord>("queue.list", "api/v3/queue", &[])
            .map_ok(QueueRecord::into_item)
            .try_collect()
            .await
    }

    async fn queue_delete(&self, id: u64, blacklist: bool) -> PvrResult<()> {
        let mut url = self.endpoint(&format!("api/v3/queue/{id}"))?;
        url.query_pairs_mut()
            .append_pair("removeFromClient", "true")
            .append_pair("blocklist", if blacklist { "true" } else { "false" });
        self.send("queue.delete", Method::DELETE, url).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    page: u32,
    fetched: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    page: u32,
    page_size: u32,
    total_records: u64,
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    event_type: EventKind,
    date: DateTime<Utc>,
    #[serde(default)]
    source_title: String,
    #[serde(default)]
    download_id: Option<String>,
    #[serde(default)]
    data: HistoryData,
    #[serde(default)]
    movie_id: Option<u64>,
    #[serde(default)]
    series_id: Option<u64>,
    #[serde(default)]
    episode_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryData {
    #[serde(default)]
    download_client: Option<String>,
}

impl HistoryRecord {
    fn group_key(&self, kind: PvrKind) -> Option<GroupKey> {
        match kind {
            PvrKind::Radarr => self.movie_id.map(GroupKey::Movie),
            PvrKind::Sonarr => Some(GroupKey::Episode {
                series: self.series_id?,
                episode: self.episode_id?,
            }),
        }
    }

    fn into_event(self, kind: PvrKind) -> Option<HistoryEvent> {
        let group_key = self.group_key(kind)?;
        Some(HistoryEvent {
            kind: self.event_type,
            date: self.date,
            download_client: self.data.download_client,
            download_id: self.download_id,
            source_title: self.source_title,
            group_key,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueRecord {
    id: u64,
    #[serde(default)]
    download_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    status_messages: Vec<StatusMessage>,
}

#[derive(Debug, Deserialize)]
struct StatusMessage {
    #[serde(default)]
    messages: Vec<String>,
}

impl QueueRecord {
    fn into_item(self) -> QueueItem {
        QueueItem {
            id: self.id,
            download_id: self.download_id,
            title: self.title,
            status_messages: self
                .status_messages
                .into_iter()
                .flat_map(|status| status.messages)
                .collect(),
        }
    }
}
