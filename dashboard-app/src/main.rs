use psx_dashboard::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    log::info!(
        "Starting PSX Dashboard (secrets file: {})",
        settings.secrets_file.display()
    );

    app_lib::run(settings).await
}
