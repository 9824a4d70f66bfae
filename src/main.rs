use clap::Parser;

use kv_ttl::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    init_logger_from_settings(&settings)?;

    tracing::debug!(
        app = %settings.application.name,
        version = kv_ttl::pkg_version(),
        "starting"
    );

    execute_command(&cli, settings, &mut std::io::stdout()).await
}
