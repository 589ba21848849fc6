/*
 * Responsibility
 * - tokio runtime の起動
 * - app::run() を呼ぶだけ (ロジックは置かない)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    marketplace_gateway::app::run().await
}
