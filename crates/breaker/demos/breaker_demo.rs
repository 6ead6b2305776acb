// crates/breaker/demos/breaker_demo.rs
//! Demonstration of a shared circuit breaker

use std::io;
use std::sync::Arc;
use std::time::Duration;
use tripwire_breaker::{Breaker, BreakerConfig, BreakerError, BreakerEvent, KillSwitch};
use tripwire_core::Namespace;
use tripwire_store::SqliteStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Tripwire Circuit Breaker Demo");
    println!("=============================\n");

    let store = Arc::new(SqliteStore::in_memory().await?);
    let (switch, handle) = KillSwitch::manual();

    let config = BreakerConfig::new(Namespace::new("inventory-api")?)
        .with_error_threshold(3)
        .with_error_timeout(Duration::from_millis(500))
        .with_kill_switch(switch)
        .with_callback(|event| match event {
            BreakerEvent::Failure(err) => println!("  callback: watched failure ({})", err),
            BreakerEvent::CircuitOpen => println!("  callback: circuit open"),
        });

    // Two workers share one circuit through the store
    let worker_a = Breaker::new(Arc::clone(&store), config.clone());
    let worker_b = Breaker::new(Arc::clone(&store), config);

    println!("1. Tripping the circuit");
    println!("-----------------------");
    for i in 1..=3 {
        let worker = if i % 2 == 0 { &worker_b } else { &worker_a };
        let result = worker
            .run(|| async {
                Err::<(), _>(io::Error::new(io::ErrorKind::TimedOut, "inventory timed out"))
            })
            .await;
        if let Err(e) = result {
            println!("  Call {}: ✗ {}", i, e);
        }
    }
    println!("  State: {}\n", worker_a.state().await?);

    println!("2. Fast failure while open");
    println!("--------------------------");
    match worker_b.run(|| async { Ok::<_, io::Error>(17) }).await {
        Err(BreakerError::Open) => println!("  ✓ Rejected without calling the dependency"),
        other => println!("  ✗ Unexpected: {:?}", other.map_err(|e| e.to_string())),
    }
    println!();

    println!("3. Kill switch");
    println!("--------------");
    handle.engage();
    let value = worker_a.run(|| async { Ok::<_, io::Error>(17) }).await?;
    println!("  ✓ Bypassed breaker, got {}", value);
    handle.release();
    println!();

    println!("4. Recovery");
    println!("-----------");
    tokio::time::sleep(Duration::from_millis(600)).await;
    let value = worker_a.run(|| async { Ok::<_, io::Error>(17) }).await?;
    println!("  ✓ Circuit closed again, got {}", value);
    println!("  Counter: {}", worker_a.counter().await?);

    Ok(())
}
