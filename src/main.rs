use anyhow::{Context, Result};
use clap::Parser;
use image_batch::cli::{blocking_thread_ceiling, execute_run, Cli, Commands, RunOptions};
use image_batch::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 並列戦略はアイテムごとにブロッキングスレッドを使うため上限をアイテム数以上にする
    let Commands::Run { directory, .. } = &cli.command;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(blocking_thread_ceiling(directory))
        .thread_name("image-batch-worker")
        .build()
        .context("非同期ランタイムを起動できません")?;

    match cli.command {
        Commands::Run {
            directory,
            strategy,
            delay_ms,
            cancel_after_ms,
            output,
            config,
            max_dimension,
            quiet,
        } => {
            let options = RunOptions {
                directory,
                strategy,
                delay_ms,
                cancel_after_ms,
                output,
                config,
                max_dimension,
                quiet,
            };
            if let Err(error) = runtime.block_on(execute_run(options)) {
                eprintln!("❌ エラー: {error:#}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
