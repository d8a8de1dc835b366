#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = notas_api::run().await {
        eprintln!("notas-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
