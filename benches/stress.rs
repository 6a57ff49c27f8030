use std::sync::Arc;
use std::time::{Duration, Instant};

use roombook::auth::SharedSecret;
use roombook::engine::{BookingEngine, SlotCatalog};
use roombook::model::{BookingRequest, DeleteCriteria, Room, Slot};
use roombook::store::MemoryStore;

const SECRET: &str = "bench";

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn rooms() -> Vec<Room> {
    (1..=10).map(|i| Room::named(format!("R{i}"))).collect()
}

/// Hourly slots 08:00-18:00.
fn slots() -> Vec<Slot> {
    (8..18)
        .filter_map(|h| Slot::parse(&format!("{h:02}:00"), &format!("{:02}:00", h + 1)))
        .collect()
}

fn engine() -> Arc<BookingEngine> {
    let store = Arc::new(MemoryStore::seeded(&rooms(), &slots()));
    Arc::new(BookingEngine::new(
        store,
        Arc::new(SlotCatalog::new(rooms(), slots())),
        SharedSecret::new(SECRET.into()),
    ))
}

/// The `i`th bookable hour for a room, walking forward day by day.
fn nth_booking(room: &str, i: usize) -> BookingRequest {
    let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
        + chrono::Days::new((i / 10) as u64);
    let hour = 8 + i % 10;
    BookingRequest {
        room: room.into(),
        date: day.format("%Y-%m-%d").to_string(),
        start: format!("{hour:02}:00"),
        end: format!("{:02}:00", hour + 1),
        reserved_by: "bench".into(),
        note: String::new(),
        secret: SECRET.into(),
    }
}

async fn phase1_sequential(engine: &BookingEngine, n: usize) {
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();
    for i in 0..n {
        let t = Instant::now();
        engine.create(&nth_booking("R1", i)).await.unwrap();
        latencies.push(t.elapsed());
    }
    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} bookings in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("create", &mut latencies);
}

async fn phase2_conflicts(engine: &BookingEngine, n: usize) {
    let mut latencies = Vec::with_capacity(n);
    let mut rejected = 0;
    for i in 0..n {
        let t = Instant::now();
        if engine.create(&nth_booking("R1", i)).await.is_err() {
            rejected += 1;
        }
        latencies.push(t.elapsed());
    }
    println!("  {rejected}/{n} rejected as conflicts");
    print_latency("conflicting create", &mut latencies);
}

async fn phase3_read_under_load(engine: Arc<BookingEngine>, readers: usize, reads_each: usize) {
    let writer = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let _ = engine.create(&nth_booking("R2", i)).await;
            }
        })
    };

    let mut handles = Vec::new();
    for _ in 0..readers {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_each);
            for _ in 0..reads_each {
                let t = Instant::now();
                engine
                    .queries()
                    .available_slots("R1", "2024-01-05")
                    .await
                    .unwrap();
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all = Vec::new();
    for h in handles {
        if let Ok(latencies) = h.await {
            all.extend(latencies);
        }
    }
    let _ = writer.await;
    print_latency("available slots", &mut all);
}

async fn phase4_repeating_and_delete(engine: &BookingEngine) {
    let t = Instant::now();
    let report = engine
        .create_repeating(&nth_booking("R3", 0), 52)
        .await
        .unwrap();
    let created = report.iter().filter(|o| o.is_created()).count();
    println!("  52-week series: {created} created in {:.2}ms", t.elapsed().as_secs_f64() * 1000.0);

    let mut latencies = Vec::new();
    for o in &report {
        let Ok(reservation) = &o.outcome else { continue };
        let t = Instant::now();
        engine
            .delete(&DeleteCriteria {
                id: reservation.id.map(|id| id.to_string()),
                secret: SECRET.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        latencies.push(t.elapsed());
    }
    print_latency("delete by id", &mut latencies);
}

#[tokio::main]
async fn main() {
    let n: usize = std::env::var("ROOMBOOK_BENCH_OPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    println!("=== roombook engine benchmark (memory store) ===\n");
    let engine = engine();

    println!("[phase 1] sequential create");
    phase1_sequential(&engine, n).await;

    println!("\n[phase 2] overlapping creates");
    phase2_conflicts(&engine, n.min(200)).await;

    println!("\n[phase 3] reads under write load");
    phase3_read_under_load(engine.clone(), 8, 100).await;

    println!("\n[phase 4] repeating series and delete");
    phase4_repeating_and_delete(&engine).await;

    println!("\n=== benchmark complete ===");
}
