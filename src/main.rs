mod app;

use anyhow::Result;
use app::{App, Cli};
use clap::Parser;
use soalgen::config::Config;
use soalgen::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    App::new(config).run(cli).await
}
