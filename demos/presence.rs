use dabblebase_rs::{Dabblebase, DabblebaseConfig, PresenceEvent};
use serde_json::json;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let client = Dabblebase::new(DabblebaseConfig::from_env()?)?;
    let auth_token = std::env::var("DABBLEBASE_AUTH_TOKEN").ok();

    let (conn, mut events) = client.realtime.connect_presence(auth_token.as_deref()).await?;
    println!("✅ Joined {}\n", conn.topic());

    let online_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    conn.track(json!({"online_at": online_at.to_string()})).await?;
    println!("📍 Tracking presence");

    let listener = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PresenceEvent::Join { key, meta } => println!("👋 {} joined ({:?})", key, meta.data),
                PresenceEvent::Leave { key, .. } => println!("🚪 {} left", key),
                PresenceEvent::State(state) => {
                    println!("👥 {} user(s) present", state.len());
                }
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(30)).await;

    conn.untrack().await?;
    conn.disconnect().await;
    listener.await?;
    println!("👋 Disconnected");
    Ok(())
}
