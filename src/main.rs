use clap::Parser;
use ebird_weather::{
    ArchiveClient, BatchRunner, Cli, Commands, CursorStore, Pipeline, PipelineError,
};
use log::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), PipelineError> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp_secs()
        .init();

    let result = run(&cli).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

async fn run(cli: &Cli) -> Result<(), PipelineError> {
    let pipeline = Pipeline::builder()
        .observations(cli.observations.clone())
        .coordinates(cli.coordinates.clone())
        .weather(cli.weather.clone())
        .region(cli.region.clone())
        .precision(cli.precision())
        .build();

    match &cli.command {
        Commands::Coords => {
            let count = pipeline.extract_coordinates()?;
            info!("Wrote {} coordinates to {}", count, cli.coordinates.display());
        }
        Commands::Fetch(args) => {
            let runner = BatchRunner::new(args.batch_config())?;
            let client = ArchiveClient::builder()
                .base_url(args.base_url.clone())
                .maybe_timeout(args.timeout())
                .maybe_user_agent(args.user_agent.clone())
                .maybe_cache_dir(args.resolve_cache_dir()?)
                .build()
                .await?;
            let cursor = CursorStore::new(&args.progress.progress);
            let summary = pipeline.fetch_weather(&client, &runner, &cursor).await?;
            info!(
                "Fetched {} batches ({} requests, {} retries), {} rows written to {}",
                summary.batches,
                summary.fetches,
                summary.retries,
                summary.rows_written,
                pipeline.weather_path().display()
            );
        }
        Commands::Merge { output } => {
            let rows = pipeline.merge(output)?;
            info!("Wrote {} merged rows to {}", rows, output.display());
        }
        Commands::Status { progress } => {
            let status = pipeline.status(&CursorStore::new(&progress.progress))?;
            println!(
                "coordinates: {}\ncursor: {}\nweather rows: {}\ncomplete: {}",
                status.coordinates,
                status.cursor,
                status.weather_rows,
                status.is_complete()
            );
        }
    }
    Ok(())
}
