use slack_jukebox::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    slack_jukebox::run(config).await
}
