// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Caches the number of robberies in a crimes collection for 20 seconds.
//!
//! The first read runs the slow count and caches it. Reads within the next 20 seconds are
//! answered from the cache. A burst of concurrent readers after an invalidation shares a single
//! count.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use readthru::{Coordinator, KeyError, Query, QueryKey};
use serde::Serialize;
use tokio::time::Instant;

const TTL: Duration = Duration::from_secs(20);

/// Stand-in for a document collection with a slow full scan.
struct Crimes {
    primary_types: Vec<&'static str>,
    scans: AtomicUsize,
}

impl Crimes {
    fn sample() -> Self {
        let primary_types = ["ROBBERY", "THEFT", "BATTERY", "ROBBERY", "NARCOTICS", "ROBBERY"]
            .into_iter()
            .cycle()
            .take(60_000)
            .collect();
        Self {
            primary_types,
            scans: AtomicUsize::new(0),
        }
    }

    async fn count_matching(&self, primary_type: &str) -> u64 {
        self.scans.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(750)).await;
        let matching = self.primary_types.iter().filter(|t| **t == primary_type).count();
        u64::try_from(matching).unwrap_or(u64::MAX)
    }
}

/// `crimes.find({"Primary Type": <primary_type>}).count()`
#[derive(Serialize)]
struct CountMatching {
    #[serde(rename = "Primary Type")]
    primary_type: &'static str,
    #[serde(skip)]
    crimes: Arc<Crimes>,
}

impl Query for CountMatching {
    type Output = u64;
    type Error = io::Error;

    fn key(&self) -> Result<QueryKey, KeyError> {
        QueryKey::derive("crimes.count", self)
    }

    async fn execute(self) -> Result<u64, io::Error> {
        Ok(self.crimes.count_matching(self.primary_type).await)
    }
}

#[tokio::main]
async fn main() -> Result<(), readthru::Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let crimes = Arc::new(Crimes::sample());
    let coordinator: Coordinator<u64, _> = Coordinator::builder_memory().name("crimes").build();
    let robberies = || CountMatching {
        primary_type: "ROBBERY",
        crimes: Arc::clone(&crimes),
    };

    for attempt in ["cold", "warm"] {
        let start = Instant::now();
        let count = coordinator.query(robberies(), TTL).await?;
        println!("{attempt} read: {count} robberies in {:?}", start.elapsed());
    }

    coordinator.invalidate(&robberies().key()?).await?;
    println!("\nInvalidated; 5 concurrent readers...");

    let mut handles = Vec::new();
    for reader in 1..=5 {
        let coordinator = coordinator.clone();
        let query = robberies();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            let count = coordinator.query(query, TTL).await;
            (reader, count, start.elapsed())
        }));
    }

    for handle in handles {
        let (reader, count, elapsed) = handle.await.expect("reader task panicked");
        println!("  reader {reader}: {} robberies in {elapsed:?}", count?);
    }

    let stats = coordinator.stats();
    println!(
        "\n{} full scans for {} reads ({} hits, {} coalesced)",
        crimes.scans.load(Ordering::SeqCst),
        stats.hits + stats.misses,
        stats.hits,
        stats.coalesced
    );
    Ok(())
}
