//! A load generator for the aggregator's `/publish` and `/stats`
//! endpoints.
//!
//! Sends a configurable count of events in batches, with a chosen
//! fraction drawn as duplicates of already-sent identities, then
//! diffs `/stats` before and after to check the expected
//! `unique_processed`/`duplicate_dropped` deltas. A background task
//! polls `/stats` throughout the run to confirm it stays responsive
//! under sustained `/publish` load.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load generator for the event aggregator")]
struct Args {
    /// Total number of events to send (unique + duplicates).
    #[arg(short = 'n', long, default_value = "5000")]
    events: usize,

    /// Fraction of `events` drawn as duplicates of already-generated
    /// identities, in [0.0, 1.0).
    #[arg(short = 'p', long, default_value = "0.20")]
    duplicate_fraction: f64,

    /// Events per `POST /publish` call.
    #[arg(short = 'b', long, default_value = "100")]
    batch_size: usize,

    /// Aggregator base URL. Falls back to `AGGREGATOR_URL`, then
    /// `http://localhost:8080`.
    #[arg(long)]
    url: Option<String>,

    /// Topic to publish under.
    #[arg(short = 't', long, default_value = "loadtest")]
    topic: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct ResponsivenessCheck {
    checked: bool,
    all_within_deadline: bool,
}

async fn fetch_stats(client: &reqwest::Client, base_url: &str) -> Result<Value> {
    client
        .get(format!("{base_url}/stats"))
        .send()
        .await
        .context("failed to reach aggregator")?
        .json::<Value>()
        .await
        .context("failed to parse /stats response")
}

fn generate_event(topic: &str, event_id: &str) -> Value {
    json!({
        "topic": topic,
        "event_id": event_id,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "source": "load-tester",
        "payload": {"run_id": uuid::Uuid::new_v4().to_string()},
    })
}

/// Spawns a task that polls `/stats` on an interval until told to
/// stop, recording whether every poll completed within the 2s
/// responsiveness budget from the design.
fn spawn_responsiveness_poller(
    client: reqwest::Client,
    base_url: String,
) -> (tokio::task::JoinHandle<()>, Arc<Mutex<ResponsivenessCheck>>) {
    let result = Arc::new(Mutex::new(ResponsivenessCheck {
        checked: false,
        all_within_deadline: true,
    }));
    let result_clone = result.clone();

    let handle = tokio::spawn(async move {
        loop {
            let start = Instant::now();
            let outcome = tokio::time::timeout(
                Duration::from_secs(2),
                client.get(format!("{base_url}/stats")).send(),
            )
            .await;

            let mut state = result_clone.lock().await;
            state.checked = true;
            match outcome {
                Ok(Ok(resp)) if resp.status().is_success() => {}
                _ => state.all_within_deadline = false,
            }
            drop(state);

            if start.elapsed() < Duration::from_millis(500) {
                tokio::time::sleep(Duration::from_millis(500) - start.elapsed()).await;
            }
        }
    });

    (handle, result)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let base_url = args
        .url
        .or_else(|| std::env::var("AGGREGATOR_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let client = reqwest::Client::new();

    println!("target aggregator: {base_url}");
    for attempt in 1..=5 {
        match client.get(format!("{base_url}/stats")).send().await {
            Ok(_) => break,
            Err(_) if attempt < 5 => {
                println!("waiting for aggregator (attempt {attempt}/5)...");
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            Err(e) => return Err(e).context("could not reach aggregator after 5 attempts"),
        }
    }

    let num_duplicates = (args.events as f64 * args.duplicate_fraction).round() as usize;
    let num_unique = args.events.saturating_sub(num_duplicates);
    println!("unique: {num_unique}, duplicates: {num_duplicates}");

    let unique_events: Vec<Value> = (0..num_unique)
        .map(|_| generate_event(&args.topic, &uuid::Uuid::new_v4().to_string()))
        .collect();

    let mut rng = rand::thread_rng();
    let mut all_events: Vec<Value> = unique_events.clone();
    for _ in 0..num_duplicates {
        if let Some(e) = unique_events.choose(&mut rng) {
            all_events.push(e.clone());
        }
    }
    all_events.shuffle(&mut rng);

    let stats_before = fetch_stats(&client, &base_url).await?;
    println!(
        "stats before -> unique_processed: {}, duplicate_dropped: {}",
        stats_before["unique_processed"], stats_before["duplicate_dropped"]
    );

    let (poller_handle, responsiveness) = spawn_responsiveness_poller(client.clone(), base_url.clone());

    let start = Instant::now();
    let mut sent = 0usize;
    for chunk in all_events.chunks(args.batch_size) {
        let response = client
            .post(format!("{base_url}/publish"))
            .json(chunk)
            .send()
            .await
            .context("failed to send batch")?;

        if !response.status().is_success() {
            eprintln!("batch rejected: {}", response.status());
        }

        sent += chunk.len();
        print!("\rsent {sent}/{}", all_events.len());
    }
    println!("\nsent {} events in {:.2}s", all_events.len(), start.elapsed().as_secs_f64());

    println!("waiting for the consumer to drain...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    poller_handle.abort();
    let stats_after = fetch_stats(&client, &base_url).await?;

    let unique_delta = stats_after["unique_processed"].as_u64().unwrap_or(0)
        - stats_before["unique_processed"].as_u64().unwrap_or(0);
    let duplicate_delta = stats_after["duplicate_dropped"].as_u64().unwrap_or(0)
        - stats_before["duplicate_dropped"].as_u64().unwrap_or(0);

    println!("\n--- results ---");
    println!("unique_processed delta: {unique_delta} (expected {num_unique})");
    println!("duplicate_dropped delta: {duplicate_delta} (expected {num_duplicates})");

    if unique_delta == num_unique as u64 {
        println!("PASS: unique count matches");
    } else {
        println!("FAIL: unique count mismatch");
    }

    let check = responsiveness.lock().await;
    if !check.checked {
        println!("responsiveness check never ran");
    } else if check.all_within_deadline {
        println!("PASS: /stats stayed responsive throughout the run");
    } else {
        println!("FAIL: /stats missed the 2s responsiveness budget at least once");
    }

    Ok(())
}
