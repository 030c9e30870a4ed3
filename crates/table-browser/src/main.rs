use clap::Parser;

use table_browser::{
    adapters,
    cli::Args,
    core::backend,
    error::{AppError, AppResult},
    logging, TableEngine,
};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    rt.block_on(async move {
        let backend = match backend::connect(&args.database_url, &args.connect_options()).await {
            Ok(b) => b,
            Err(e) => {
                if let AppError::BackendUnavailable(detail) = &e {
                    tracing::error!(%detail, "cannot reach database");
                }
                return Err(e);
            }
        };
        let engine = TableEngine::new(backend, args.page_limits());

        let res = adapters::bridge::run(engine.clone()).await;
        engine.close().await;
        res
    })
}
