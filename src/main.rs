#[tokio::main]
async fn main() {
    if let Err(e) = screenloop::run().await {
        eprintln!("screenloop failed: {e}");
        std::process::exit(1);
    }
}
