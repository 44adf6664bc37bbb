//! Readers racing reloads must always see one complete snapshot.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cidrd::reload::{LoadError, PrefixSource, ReloadController};

mod common;

/// Alternates between two disjoint prefix sets on every read.
#[derive(Debug)]
struct Flipping {
    reads: AtomicUsize,
    a: String,
    b: String,
}

impl Flipping {
    fn new() -> Self {
        let a = (0..=255).map(|i| format!("10.{i}.0.0/16\n")).collect();
        let b = (0..=255).map(|i| format!("172.{}.{i}.0/24\n", 16 + i % 16)).collect();
        Self {
            reads: AtomicUsize::new(0),
            a,
            b,
        }
    }
}

impl PrefixSource for Flipping {
    fn read(&self) -> Result<String, LoadError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(if n % 2 == 0 { self.a.clone() } else { self.b.clone() })
    }

    fn describe(&self) -> String {
        "flipping".into()
    }
}

fn probes_a() -> Vec<String> {
    (0..=255).step_by(5).map(|i| format!("10.{i}.1.1")).collect()
}

fn probes_b() -> Vec<String> {
    (0..=255).step_by(5).map(|i| format!("172.{}.{i}.9", 16 + i % 16)).collect()
}

#[test]
fn readers_never_observe_a_mixed_index() {
    let controller = Arc::new(ReloadController::initialize(Arc::new(Flipping::new())).unwrap());
    let stop = Arc::new(AtomicBool::new(false));
    let probes_a = Arc::new(probes_a());
    let probes_b = Arc::new(probes_b());

    let writer = {
        let controller = Arc::clone(&controller);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut reloads = 0;
            loop {
                controller.load().unwrap();
                reloads += 1;
                if stop.load(Ordering::Relaxed) {
                    break reloads;
                }
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let probes_a = Arc::clone(&probes_a);
            let probes_b = Arc::clone(&probes_b);
            std::thread::spawn(move || {
                let mut seen_a = 0;
                let mut seen_b = 0;
                for _ in 0..400 {
                    let snap = controller.current_index();
                    let a_hits = probes_a.iter().filter(|p| snap.contains(p)).count();
                    let b_hits = probes_b.iter().filter(|p| snap.contains(p)).count();

                    match (a_hits, b_hits) {
                        (a, 0) if a == probes_a.len() => seen_a += 1,
                        (0, b) if b == probes_b.len() => seen_b += 1,
                        other => panic!("torn snapshot {} saw {:?}", snap.generation, other),
                    }
                }
                (seen_a, seen_b)
            })
        })
        .collect();

    let mut totals = (0, 0);
    for reader in readers {
        let (a, b) = reader.join().unwrap();
        totals.0 += a;
        totals.1 += b;
    }
    stop.store(true, Ordering::Relaxed);
    let reloads = writer.join().unwrap();

    assert_eq!(totals.0 + totals.1, 8 * 400);
    assert!(reloads > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn socket_clients_during_reload_storm() {
    let server = common::TestServer::start_with("10.0.0.0/8\n", |config| {
        config.refresh_interval = Some(Duration::from_millis(2));
    })
    .await;
    let stop = Arc::new(AtomicBool::new(false));

    // Replace the file by rename so a reload never reads a half-written list.
    let flipper = {
        let stop = Arc::clone(&stop);
        let cidrs = server.cidrs.clone();
        tokio::spawn(async move {
            let staging = cidrs.with_extension("staging");
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let text = if flip { "10.0.0.0/8\n" } else { "10.0.0.0/8\n192.168.0.0/16\n" };
                std::fs::write(&staging, text).unwrap();
                std::fs::rename(&staging, &cidrs).unwrap();
                flip = !flip;
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
        })
    };

    let clients: Vec<_> = (0..16)
        .map(|_| {
            let socket = server.socket.clone();
            tokio::spawn(async move {
                let mut client = common::Client::connect(&socket).await;
                for _ in 0..100 {
                    assert_eq!(client.query("10.1.2.3").await, "FOUND");
                    let other = client.query("192.168.1.1").await;
                    assert!(other == "FOUND" || other == "NOT_FOUND", "{other}");
                    assert_eq!(client.query("garbage").await, "NOT_FOUND");
                }
            })
        })
        .collect();

    for client in clients {
        client.await.unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    flipper.await.unwrap();

    server.stop().await.unwrap();
}
