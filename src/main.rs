use anyhow::Result;
use backplane_operator::cli::OperatorArgs;
use backplane_operator::runtime;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = OperatorArgs::parse();

    let init_result = runtime::initialize(&args).await?;

    runtime::run_watch_loop(init_result.configs, init_result.reconciler).await
}
