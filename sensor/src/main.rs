mod publisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    publisher::run().await
}
