#[tokio::main]
async fn main() -> owlgraph::Result<()> {
    owlgraph::cli::main().await
}
