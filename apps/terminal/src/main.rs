//! Coinwise terminal entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = coinwise_terminal::run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
