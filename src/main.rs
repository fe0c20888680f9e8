mod app;
mod commands;
mod config;
mod error;
mod library;
mod logging;
mod recording;
mod setup;
mod storage;
mod ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
