// Noetter launcher - logs the note collection summary and exits

#[tokio::main]
async fn main() {
    if let Err(e) = noetter_lib::run().await {
        eprintln!("[main] {}", e);
        std::process::exit(1);
    }
}
