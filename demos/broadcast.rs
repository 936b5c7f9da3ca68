use dabblebase_rs::{Dabblebase, DabblebaseConfig};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let client = Dabblebase::new(DabblebaseConfig::from_env()?)?;
    let channel = std::env::args().nth(1).unwrap_or_else(|| "lobby".to_string());

    println!("✅ Joining broadcast channel '{}'...", channel);
    let (room, mut messages) = client.realtime.connect_broadcast(&channel, None).await?;
    println!("✅ Joined {}\n", room.topic());

    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            println!("📨 Received broadcast: {}", message);
        }
        println!("⚠️  Message stream ended");
    });

    for n in 1..=3 {
        room.broadcast(json!({"user": "rust-demo", "n": n})).await?;
        println!("📤 Sent message {}", n);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    // Wait for messages from other subscribers
    println!("\n⏳ Listening for 10 seconds...");
    tokio::time::sleep(Duration::from_secs(10)).await;

    room.disconnect().await;
    println!("👋 Disconnected");
    Ok(())
}
