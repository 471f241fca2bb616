mod annotations;
mod capture;
mod config;
mod core;
mod domain;
mod engine;
mod render;
mod report;
mod session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = config::AppConfig::load();
    core::app::run(config).await
}
