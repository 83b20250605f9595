//! Concurrent health checks against a running server.

use std::time::{Duration, Instant};

use healthz_server::http::health::{HEALTH_BODY, HEALTH_PATH};
use healthz_server::{HealthResponder, VersionSource};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_health_checks() {
    let version = VersionSource::fixed("2.0.0");
    let server = common::test_server([HealthResponder::new(version.clone()).route()]);
    let (handle, addr, running) = common::start(server).await;

    let concurrency = 50;
    let url = format!("http://{}{}", addr, HEALTH_PATH);
    let client = reqwest::Client::new();
    let start = Instant::now();

    let tasks: Vec<_> = (0..concurrency)
        .map(|i| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                let res = client
                    .get(&url)
                    .header("x-request-index", i.to_string())
                    .send()
                    .await
                    .unwrap();
                let status = res.status();
                let version = res.headers()["version"].to_str().unwrap().to_string();
                let index = res.headers()["x-request-index"].to_str().unwrap().to_string();
                let body = res.text().await.unwrap();
                (status, version, index, body, i)
            })
        })
        .collect();

    for task in tasks {
        let (status, version, index, body, i) = task.await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(version, "2.0.0");
        assert_eq!(index, i.to_string());
        assert_eq!(body, HEALTH_BODY);
    }
    println!("{} concurrent health checks in {:?}", concurrency, start.elapsed());

    // A runtime version swap is visible to the next request.
    version.set("2.0.1");
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.headers()["version"], "2.0.1");

    drop(client);
    handle.cancel();
    let (mut server, _) = common::unblocked(running).await;
    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop hung")
        .unwrap();
}
