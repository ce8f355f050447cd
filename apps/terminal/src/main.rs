//! # Kaya Terminal Entry Point
//!
//! Startup lives in `lib.rs` so it can be tested and embedded.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kaya_terminal::run().await
}
