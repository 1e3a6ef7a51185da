use clap::Parser;
use ragchat_upload::{Args, UploadFailed, run, summary};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(&args).await {
        Ok(report) => {
            println!("{}", summary(&report));
            Ok(())
        }
        Err(e) => {
            if let Some(failed) = e.downcast_ref::<UploadFailed>() {
                println!("{failed}");
                println!("{}", summary(&failed.report));
            }
            Err(e)
        }
    }
}
