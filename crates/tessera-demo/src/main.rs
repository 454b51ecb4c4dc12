mod cli;

use anyhow::Result;
use tessera_engine::device::GpuInit;
use tessera_engine::logging::{LoggingConfig, init_logging};
use tessera_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse_checked();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let render = cli.render_config();
    let runtime = RuntimeConfig {
        title: format!("tessera: {}", render.label),
        initial_size: LogicalSize::new(cli.width as f64, cli.height as f64),
    };

    log::info!(
        "starting {:?} at {}x{}",
        cli.variant,
        cli.width,
        cli.height
    );

    Runtime::run(runtime, GpuInit::default(), render)
}
