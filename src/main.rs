#[tokio::main]
async fn main() {
    if let Err(e) = coopwatch_lib::run().await {
        tracing::error!("coopwatch failed: {e}");
        eprintln!("coopwatch failed: {e}");
        std::process::exit(1);
    }
}
