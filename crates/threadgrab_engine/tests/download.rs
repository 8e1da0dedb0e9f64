use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use threadgrab_core::{HarvestSettings, MediaUrl};
use threadgrab_engine::{
    task_queue, DownloadError, DownloadOutcome, Downloader, EngineEvent, FetchSettings,
    HttpDownloader, ProgressSink, RetryPolicy, WorkerPool,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MEDIA_PATH: &str = "/b/src/123/456.jpg";

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn downloader(root: &Path) -> HttpDownloader {
    let settings = HarvestSettings {
        output_root: root.to_path_buf(),
        ..HarvestSettings::default()
    };
    HttpDownloader::from_settings(&settings).unwrap()
}

fn media(server: &MockServer) -> MediaUrl {
    MediaUrl::from_relative(&server.uri(), MEDIA_PATH).unwrap()
}

fn leftover_entries(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Pushes `urls` through a one-worker pool and returns what the sink saw.
async fn run_single_worker(
    downloader: HttpDownloader,
    retry: RetryPolicy,
    urls: Vec<MediaUrl>,
) -> (threadgrab_engine::PoolReport, Vec<EngineEvent>) {
    let sink = Arc::new(TestSink::default());
    let (sender, receiver) = task_queue(1);
    let pool = WorkerPool::spawn(1, receiver, Arc::new(downloader), retry, sink.clone());
    for url in urls {
        sender.send(url).await.unwrap();
    }
    drop(sender);
    let report = pool.join().await;
    (report, sink.take())
}

#[tokio::test]
async fn saves_body_under_derived_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let outcome = downloader(temp.path()).download(&media(&server)).await.unwrap();

    assert_eq!(outcome, DownloadOutcome::Saved { bytes: 10 });
    let target = temp.path().join("123_b").join("456.jpg");
    assert_eq!(fs::read(&target).unwrap(), b"jpeg bytes");
    assert_eq!(leftover_entries(&temp.path().join("123_b")), vec!["456.jpg".to_string()]);
}

#[tokio::test]
async fn second_download_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"once".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let downloader = downloader(temp.path());
    let url = media(&server);

    assert!(matches!(
        downloader.download(&url).await.unwrap(),
        DownloadOutcome::Saved { .. }
    ));
    assert_eq!(
        downloader.download(&url).await.unwrap(),
        DownloadOutcome::AlreadyPresent
    );
}

#[tokio::test]
async fn existing_file_is_not_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("123_b");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("456.jpg"), b"old").unwrap();

    let outcome = downloader(temp.path()).download(&media(&server)).await.unwrap();
    assert_eq!(outcome, DownloadOutcome::AlreadyPresent);
    assert_eq!(fs::read(dir.join("456.jpg")).unwrap(), b"old");
}

#[tokio::test]
async fn failing_url_is_attempted_one_plus_budget_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let (report, events) = run_single_worker(
        downloader(temp.path()),
        RetryPolicy::immediate(5),
        vec![media(&server)],
    )
    .await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.attempts, 6);
    let retries = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Retrying { .. }))
        .count();
    assert_eq!(retries, 5);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Failed { attempts: 6, .. })
    ));

    // Nothing, not even a partial file, is left to block the next run.
    assert!(!temp.path().join("123_b").join("456.jpg").exists());
    assert!(leftover_entries(&temp.path().join("123_b")).is_empty());
}

const FULL_LEN: usize = 1000;

async fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }
}

/// Serves `MEDIA_PATH` over raw TCP. The first `truncated` connections
/// promise `FULL_LEN` bytes but hang up after ten; later ones send it all.
async fn flaky_media_server(truncated: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut served = 0;
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            read_request_head(&mut stream).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {FULL_LEN}\r\nConnection: close\r\n\r\n"
            );
            let body_len = if served < truncated { 10 } else { FULL_LEN };
            served += 1;
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(&vec![b'x'; body_len]).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn body_cut_short_leaves_no_file_behind() {
    let origin = flaky_media_server(usize::MAX).await;
    let url = MediaUrl::from_relative(&origin, MEDIA_PATH).unwrap();

    let temp = TempDir::new().unwrap();
    let err = downloader(temp.path()).download(&url).await.unwrap_err();

    assert!(matches!(err, DownloadError::Fetch(_)));
    assert!(err.is_retryable());
    let dir = temp.path().join("123_b");
    assert!(dir.is_dir());
    // Neither the target nor a `.part-*` temp file survives.
    assert!(leftover_entries(&dir).is_empty());
}

#[tokio::test]
async fn body_cut_short_is_retried_until_the_whole_file_lands() {
    let origin = flaky_media_server(1).await;
    let url = MediaUrl::from_relative(&origin, MEDIA_PATH).unwrap();

    let temp = TempDir::new().unwrap();
    let (report, events) = run_single_worker(
        downloader(temp.path()),
        RetryPolicy::immediate(5),
        vec![url],
    )
    .await;

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.attempts, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::Retrying { .. })));
    let dir = temp.path().join("123_b");
    assert_eq!(fs::read(dir.join("456.jpg")).unwrap().len(), FULL_LEN);
    assert_eq!(leftover_entries(&dir), vec!["456.jpg".to_string()]);
}

#[tokio::test]
async fn transient_failures_recover_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"finally".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let (report, _events) = run_single_worker(
        downloader(temp.path()),
        RetryPolicy::immediate(5),
        vec![media(&server)],
    )
    .await;

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.attempts, 3);
    assert_eq!(
        fs::read(temp.path().join("123_b").join("456.jpg")).unwrap(),
        b"finally"
    );
}

#[tokio::test]
async fn uncreatable_directory_fails_only_that_task_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/src/9/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    // A plain file where the thread directory should go.
    fs::write(temp.path().join("123_b"), b"in the way").unwrap();

    let blocked = media(&server);
    let fine = MediaUrl::from_relative(&server.uri(), "/c/src/9/1.png").unwrap();

    let err = downloader(temp.path()).download(&blocked).await.unwrap_err();
    assert!(matches!(err, DownloadError::CreateDir { .. }));
    assert!(!err.is_retryable());

    let (report, _events) = run_single_worker(
        downloader(temp.path()),
        RetryPolicy::immediate(5),
        vec![blocked, fine],
    )
    .await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.saved, 1);
    assert_eq!(report.attempts, 2);
}

#[tokio::test]
async fn shared_client_settings_apply_to_downloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_millis(250))
                .set_body_bytes(b"late".to_vec()),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let settings = FetchSettings {
        request_timeout: std::time::Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let client = threadgrab_engine::build_client(&settings).unwrap();
    let downloader = HttpDownloader::new(client, temp.path());

    let err = downloader.download(&media(&server)).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!temp.path().join("123_b").join("456.jpg").exists());
}
