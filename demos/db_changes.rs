use dabblebase_rs::{Dabblebase, DabblebaseConfig, DbChangeFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dabblebase_rs=debug".into()),
        )
        .init();

    let client = Dabblebase::new(DabblebaseConfig::from_env()?)?;
    let table = std::env::args().nth(1);

    println!("📡 Listening for database changes...");
    let filter = match &table {
        Some(table) => DbChangeFilter::all().table(table),
        None => DbChangeFilter::all(),
    };
    let (conn, mut changes) = client
        .realtime
        .connect_db_changes_with_filter(filter, None)
        .await?;
    println!("✅ Joined {}\n", conn.topic());

    while let Some(change) = changes.recv().await {
        println!(
            "📨 {} on {}: new={:?} old={:?}",
            change.operation.as_str(),
            change.table,
            change.new,
            change.old
        );
    }
    println!("⚠️  Connection closed by server");

    conn.disconnect().await;
    println!("👋 Disconnected");
    Ok(())
}
