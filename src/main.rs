#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizglass::run().await {
        eprintln!("quizglass fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
