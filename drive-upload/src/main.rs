use drive_upload::actions;
use drive_upload::config::UploadConfig;
use drive_upload::logging::init_logging;
use drive_upload::runtime::UploadRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

async fn upload() -> anyhow::Result<()> {
    let config = UploadConfig::from_env()?;
    let runtime = UploadRuntime::bootstrap(config).await?;
    runtime.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let result = match parse_cli_mode(std::env::args()) {
        Ok(CliMode::Help) => {
            println!("Usage: drive-upload [--help]");
            println!("  Inputs are read from INPUT_* environment variables:");
            println!("  INPUT_FILENAME, INPUT_FOLDERID, INPUT_CREDENTIALS (required)");
            println!("  INPUT_NAME, INPUT_MIMETYPE, INPUT_NAMEPREFIX, INPUT_OVERWRITE,");
            println!("  INPUT_USECOMPLETESOURCEFILENAMEASNAME, INPUT_MIRRORDIRECTORYSTRUCTURE");
            return Ok(());
        }
        Ok(CliMode::Run) => upload().await,
        Err(err) => Err(err),
    };
    if let Err(err) = &result {
        tracing::error!("{err:#}");
        actions::error(&format!("{err:#}"));
    }
    result
}
