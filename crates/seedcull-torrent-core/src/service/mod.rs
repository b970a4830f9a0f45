//! Download-client trait implemented by transport adapters.

use async_trait::async_trait;

use crate::error::{TorrentError, TorrentResult};
use crate::model::{ClientFamily, Torrent, TorrentRateLimit};

/// Operations the pruning engine needs from a download client.
///
/// Torrent identifiers are the client's info hashes. Methods taking a slice
/// act on every listed torrent in one request; an empty slice is a no-op.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Client family this adapter speaks to.
    fn family(&self) -> ClientFamily;

    /// Snapshot every torrent the client knows about.
    async fn list_torrents(&self) -> TorrentResult<Vec<Torrent>>;

    /// Remove torrents together with their on-disk payload.
    async fn delete_permanently(&self, hashes: &[String]) -> TorrentResult<()>;

    /// Stop transferring the listed torrents.
    async fn pause(&self, hashes: &[String]) -> TorrentResult<()>;

    /// Restart transfer for the listed torrents.
    async fn resume(&self, hashes: &[String]) -> TorrentResult<()>;

    /// Apply global transfer limits; default implementation reports lack of support.
    async fn set_speed_limits(&self, limits: TorrentRateLimit) -> TorrentResult<()> {
        let _ = limits;
        Err(TorrentError::Unsupported {
            operation: "transfer.set_limits",
        })
    }

    /// Free bytes on the download volume, when the client reports it.
    async fn free_space(&self) -> TorrentResult<Option<u64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubClient;

    #[async_trait]
    impl DownloadClient for StubClient {
        fn family(&self) -> ClientFamily {
            ClientFamily::Transmission
        }

        async fn list_torrents(&self) -> TorrentResult<Vec<Torrent>> {
            Ok(Vec::new())
        }

        async fn delete_permanently(&self, _hashes: &[String]) -> TorrentResult<()> {
            Ok(())
        }

        async fn pause(&self, _hashes: &[String]) -> TorrentResult<()> {
            Ok(())
        }

        async fn resume(&self, _hashes: &[String]) -> TorrentResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn optional_methods_have_conservative_defaults() {
        let client = StubClient;
        let err = client
            .set_speed_limits(TorrentRateLimit {
                download_bps: Some(1_024),
                upload_bps: None,
            })
            .await
            .expect_err("speed limits should be unsupported");
        assert!(matches!(
            err,
            TorrentError::Unsupported {
                operation: "transfer.set_limits"
            }
        ));
        assert_eq!(client.free_space().await.expect("free space"), None);
        assert_eq!(client.family(), ClientFamily::Transmission);
    }
}
