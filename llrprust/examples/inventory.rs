//! Run a tag inventory against a live reader

use std::time::Duration;

use llrprust::{Reader, RequestedCapabilities, RoSpec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llrprust=debug".into()),
        )
        .init();

    // Change to your reader IP
    let host = std::env::var("READER_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());

    println!("Connecting to {}...", host);

    let mut reader = Reader::new(host, 5084).with_timeout(Duration::from_secs(10));
    reader.connect().await?;
    println!("✓ Connected");

    // Show what the reader can do
    let caps = reader.get_capabilities(RequestedCapabilities::All).await?;
    if let Some(general) = &caps.general {
        println!(
            "✓ Reader: {} {} (firmware {}, {} antennas)",
            general.manufacturer_name,
            general.model_name,
            general.firmware_version,
            general.max_antennas
        );
    }

    // Keepalives every 10 seconds so a dead link is noticed
    reader.enable_keepalive(Duration::from_secs(10)).await?;

    // Start from a clean slate, then run an immediate inventory on all
    // antennas
    reader.delete_rospec(0).await.ok();
    let mut tags = reader.tag_reports();

    reader.add_rospec(RoSpec::immediate_inventory(1, vec![0])).await?;
    reader.enable_rospec(1).await?;
    reader.start_rospec(1).await?;
    println!("✓ Inventory running, reading for 10 seconds...");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut count = 0usize;
    while let Ok(Ok(tag)) = tokio::time::timeout_at(deadline, tags.recv()).await {
        count += 1;
        println!(
            "  {} antenna={:?} rssi={:?} seen={:?}",
            tag.epc_hex(),
            tag.antenna_id,
            tag.peak_rssi,
            tag.seen_count
        );
    }
    println!("✓ {} tag reports", count);

    // Tear the job down and disconnect
    reader.delete_rospec(1).await?;
    reader.close().await?;
    println!("✓ Disconnected");

    Ok(())
}
