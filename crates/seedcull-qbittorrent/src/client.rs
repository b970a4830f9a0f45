//! Session-holding WebUI client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use seedcull_torrent_core::{
    ClientFamily, DownloadClient, Torrent, TorrentError, TorrentRateLimit, TorrentResult,
};
use tracing::{debug, info};

use crate::wire::{MainData, TorrentInfo};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const LOGIN_OK: &str = "Ok.";

/// Authenticated qBittorrent WebUI session.
#[derive(Debug, Clone)]
pub struct QbClient {
    base_url: Url,
    http: Client,
}

impl QbClient {
    /// Open a session against the WebUI at `url`.
    ///
    /// Credentials are taken from the URL's userinfo; without them the
    /// WebUI must allow unauthenticated access (e.g. localhost bypass).
    /// The whole attempt is bounded by `connect_timeout`.
    ///
    /// # Errors
    ///
    /// - [`TorrentError::Unavailable`] when the WebUI cannot be reached in time.
    /// - [`TorrentError::LoginRejected`] when the credentials are refused.
    pub async fn connect(url: &str, connect_timeout: Duration) -> TorrentResult<Self> {
        let mut base_url =
            Url::parse(url).map_err(|err| TorrentError::operation("client.connect", err))?;
        let username = base_url.username().to_string();
        let password = base_url.password().map(str::to_string);
        // Userinfo is consumed here; requests never carry it.
        let _ = base_url.set_username("");
        let _ = base_url.set_password(None);
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .cookie_store(true)
            .connect_timeout(connect_timeout)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| TorrentError::operation("client.build", err))?;
        let client = Self { base_url, http };

        let handshake = async {
            if username.is_empty() {
                client.probe().await
            } else {
                client
                    .login(&username, password.as_deref().unwrap_or_default())
                    .await
            }
        };
        tokio::time::timeout(connect_timeout, handshake)
            .await
            .map_err(TorrentError::unavailable)??;

        info!(url = %client.base_url, "connected to qBittorrent");
        Ok(client)
    }

    async fn login(&self, username: &str, password: &str) -> TorrentResult<()> {
        let response = self
            .post_raw(
                "auth.login",
                "api/v2/auth/login",
                &[("username", username), ("password", password)],
            )
            .await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport("auth.login", err))?;
        if status.is_success() && body.trim() == LOGIN_OK {
            Ok(())
        } else {
            Err(TorrentError::LoginRejected {
                detail: Some(body.trim().to_string()).filter(|detail| !detail.is_empty()),
            })
        }
    }

    async fn probe(&self) -> TorrentResult<()> {
        let response = self
            .http
            .get(self.endpoint("api/v2/app/version")?)
            .send()
            .await
            .map_err(|err| transport("app.version", err))?;
        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                Err(TorrentError::LoginRejected { detail: None })
            }
            status if status.is_success() => Ok(()),
            status => Err(TorrentError::Status {
                operation: "app.version",
                status: status.as_u16(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> TorrentResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| TorrentError::operation("client.endpoint", err))
    }

    async fn post_raw(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> TorrentResult<Response> {
        self.http
            .post(self.endpoint(path)?)
            .form(form)
            .send()
            .await
            .map_err(|err| transport(operation, err))
    }

    async fn post(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> TorrentResult<()> {
        let response = self.post_raw(operation, path, form).await?;
        ensure_success(operation, &response)
    }

    /// Issue a start/stop style request, falling back to the pre-5.0
    /// endpoint name when the current one is missing.
    async fn toggle(
        &self,
        operation: &'static str,
        current: &str,
        legacy: &str,
        hashes: &[String],
    ) -> TorrentResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        let joined = hashes.join("|");
        let form = [("hashes", joined.as_str())];
        let response = self.post_raw(operation, current, &form).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(operation, legacy, "falling back to legacy endpoint");
            return self.post(operation, legacy, &form).await;
        }
        ensure_success(operation, &response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> TorrentResult<T> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|err| transport(operation, err))?;
        ensure_success(operation, &response)?;
        response
            .json()
            .await
            .map_err(|err| TorrentError::operation(operation, err))
    }
}

#[async_trait]
impl DownloadClient for QbClient {
    fn family(&self) -> ClientFamily {
        ClientFamily::Qbittorrent
    }

    async fn list_torrents(&self) -> TorrentResult<Vec<Torrent>> {
        let entries: Vec<TorrentInfo> = self
            .get_json("torrents.list", "api/v2/torrents/info")
            .await?;
        Ok(entries.into_iter().map(TorrentInfo::into_torrent).collect())
    }

    async fn delete_permanently(&self, hashes: &[String]) -> TorrentResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        let joined = hashes.join("|");
        self.post(
            "torrents.delete",
            "api/v2/torrents/delete",
            &[("hashes", joined.as_str()), ("deleteFiles", "true")],
        )
        .await
    }

    async fn pause(&self, hashes: &[String]) -> TorrentResult<()> {
        self.toggle(
            "torrents.pause",
            "api/v2/torrents/stop",
            "api/v2/torrents/pause",
            hashes,
        )
        .await
    }

    async fn resume(&self, hashes: &[String]) -> TorrentResult<()> {
        self.toggle(
            "torrents.resume",
            "api/v2/torrents/start",
            "api/v2/torrents/resume",
            hashes,
        )
        .await
    }

    async fn set_speed_limits(&self, limits: TorrentRateLimit) -> TorrentResult<()> {
        if let Some(upload) = limits.upload_bps {
            let limit = upload.to_string();
            self.post(
                "transfer.upload_limit",
                "api/v2/transfer/setUploadLimit",
                &[("limit", limit.as_str())],
            )
            .await?;
        }
        if let Some(download) = limits.download_bps {
            let limit = download.to_string();
            self.post(
                "transfer.download_limit",
                "api/v2/transfer/setDownloadLimit",
                &[("limit", limit.as_str())],
            )
            .await?;
        }
        Ok(())
    }

    async fn free_space(&self) -> TorrentResult<Option<u64>> {
        let data: MainData = self
            .get_json("sync.maindata", "api/v2/sync/maindata")
            .await?;
        Ok(data
            .server_state
            .and_then(|state| state.free_space_on_disk)
            .and_then(|bytes| u64::try_from(bytes).ok()))
    }
}

fn ensure_success(operation: &'static str, response: &Response) -> TorrentResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(TorrentError::Status {
            operation,
            status: status.as_u16(),
        })
    }
}

fn transport(operation: &'static str, err: reqwest::Error) -> TorrentError {
    if err.is_connect() || err.is_timeout() {
        TorrentError::unavailable(err)
    } else {
        TorrentError::operation(operation, err)
    }
}
