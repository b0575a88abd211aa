//! Slipway binary entry point.

#[tokio::main]
async fn main() {
    let code = match slipway::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    std::process::exit(code);
}
