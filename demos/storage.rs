use dabblebase_rs::{Dabblebase, DabblebaseConfig, UploadFile};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let client = Dabblebase::new(DabblebaseConfig::from_env()?)?;

    let file = match std::env::args().nth(1) {
        Some(path) => UploadFile::from_path(path).await?,
        None => UploadFile::new("hello.txt", "Hello from Rust!").with_content_type("text/plain"),
    };
    let path = format!("demo/{}", file.file_name);

    println!("📤 Uploading {}...", path);
    client.storage.upload(&path, file).await?;
    println!("🔗 View at {}\n", client.storage.get_url(&path)?);

    println!("📂 Files:");
    for object in client.storage.list().await? {
        println!(
            "  {} ({} bytes, modified {})",
            object.path, object.size, object.last_modified
        );
    }

    client.storage.delete(&path).await?;
    println!("\n🗑️  Deleted {}", path);
    Ok(())
}
