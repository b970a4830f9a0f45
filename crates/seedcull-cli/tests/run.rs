use std::fs;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

struct Harness {
    qbt: MockServer,
    radarr: MockServer,
    dir: TempDir,
}

impl Harness {
    async fn start() -> anyhow::Result<Self> {
        Ok(Self {
            qbt: MockServer::start_async().await,
            radarr: MockServer::start_async().await,
            dir: TempDir::new()?,
        })
    }

    fn config(&self) -> anyhow::Result<String> {
        let yaml = format!(
            "download_client:\n  url: {qbt}\npvrs:\n  - {{ name: radarr, kind: radarr, url: \"{radarr}\", api_key: key }}\ncategories:\n  radarr: radarr\n",
            qbt = self.qbt.base_url(),
            radarr = self.radarr.base_url(),
        );
        write_config(&self.dir, &yaml)
    }

    fn seeded_import(&self) {
        self.qbt.mock(|when, then| {
            when.method(GET).path("/api/v2/app/version");
            then.status(200).body("v5.0.0");
        });
        self.qbt.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).json_body(json!([{
                "hash": "ABC123",
                "name": "Movie.2020.1080p",
                "category": "radarr",
                "size": 4_294_967_296_i64,
                "progress": 1.0,
                "ratio": 11.0,
                "state": "stalledUP",
                "added_on": 1_600_000_000_i64,
                "completion_on": 1_600_003_600_i64,
                "availability": 1.0,
                "save_path": "/data"
            }]));
        });
        self.qbt.mock(|when, then| {
            when.method(GET).path("/api/v2/sync/maindata");
            then.status(200)
                .json_body(json!({ "server_state": { "free_space_on_disk": 0 } }));
        });
        self.radarr.mock(|when, then| {
            when.method(GET).path("/api/v3/history");
            then.status(200).json_body(json!({
                "page": 1,
                "pageSize": 200,
                "totalRecords": 1,
                "records": [{
                    "id": 1,
                    "eventType": "downloadFolderImported",
                    "date": "2020-09-14T10:00:00Z",
                    "sourceTitle": "Movie.2020.1080p",
                    "downloadId": "ABC123",
                    "movieId": 42,
                    "data": { "downloadClient": "qBittorrent" }
                }]
            }));
        });
        self.radarr.mock(|when, then| {
            when.method(GET).path("/api/v3/queue");
            then.status(200).json_body(json!({
                "page": 1, "pageSize": 200, "totalRecords": 0, "records": []
            }));
        });
    }
}

fn write_config(dir: &TempDir, yaml: &str) -> anyhow::Result<String> {
    let path = dir.path().join("seedcull.yaml");
    fs::write(&path, yaml)?;
    Ok(path.display().to_string())
}

#[tokio::test]
async fn live_run_deletes_a_seeded_import() -> anyhow::Result<()> {
    let harness = Harness::start().await?;
    harness.seeded_import();
    let delete = harness.qbt.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/delete");
        then.status(200);
    });

    let config = harness.config()?;
    let code = seedcull_cli::run_with_args([
        "seedcull",
        "--config",
        config.as_str(),
        "run",
        "--output",
        "json",
    ])
    .await;

    assert_eq!(code, 0);
    delete.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn dry_run_leaves_the_client_untouched() -> anyhow::Result<()> {
    let harness = Harness::start().await?;
    harness.seeded_import();
    let delete = harness.qbt.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/delete");
        then.status(200);
    });

    let config = harness.config()?;
    let code =
        seedcull_cli::run_with_args(["seedcull", "run", "--dry-run", "--config", config.as_str()])
            .await;

    assert_eq!(code, 0);
    delete.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn status_never_mutates() -> anyhow::Result<()> {
    let harness = Harness::start().await?;
    harness.seeded_import();
    let mutations = harness.qbt.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let config = harness.config()?;
    let code = seedcull_cli::run_with_args(["seedcull", "status", "--config", config.as_str()]).await;

    assert_eq!(code, 0);
    mutations.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn unreachable_client_exits_cleanly() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = write_config(
        &dir,
        "download_client:\n  url: http://127.0.0.1:9\n  connect_timeout_secs: 1\n",
    )?;

    let code = seedcull_cli::run_with_args(["seedcull", "run", "--config", config.as_str()]).await;
    assert_eq!(code, 0);
    Ok(())
}

#[tokio::test]
async fn invalid_configuration_is_a_validation_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = write_config(
        &dir,
        "download_client:\n  url: http://127.0.0.1:8080\ncategories:\n  tv: sonarr\n",
    )?;

    let code = seedcull_cli::run_with_args(["seedcull", "run", "--config", config.as_str()]).await;
    assert_eq!(code, 2);
    Ok(())
}

#[tokio::test]
async fn rejected_login_fails_the_run() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let login = server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(200).body("Fails.");
    });

    let url = server
        .base_url()
        .replacen("http://", "http://admin:wrong@", 1);
    let code = seedcull_cli::run_with_args([
        "seedcull",
        "status",
        "--config",
        "/nonexistent/seedcull.yaml",
        "--qbt-url",
        url.as_str(),
    ])
    .await;
    assert_eq!(code, 2, "an explicit missing config file is reported first");

    let dir = TempDir::new()?;
    let config = write_config(&dir, "")?;
    let code = seedcull_cli::run_with_args([
        "seedcull",
        "status",
        "--config",
        config.as_str(),
        "--qbt-url",
        url.as_str(),
    ])
    .await;
    assert_eq!(code, 3);
    login.assert_hits(1);
    Ok(())
}
