use anyhow::Context;
use clap::Parser;
use stub_recorder::{HttpRecorder, Protocol, RecordedRequest, RecorderConfig, TcpRecorder};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stub-recorder", about = "Run a record-and-stub server until Ctrl-C")]
struct Args {
    /// YAML config file; flags below override its values
    #[arg(short, long, env = "STUB_RECORDER_CONFIG")]
    config: Option<String>,
    #[arg(short, long, env = "STUB_RECORDER_PORT")]
    port: Option<u16>,
    #[arg(long, env = "STUB_RECORDER_HOST")]
    host: Option<String>,
    #[arg(long, value_enum)]
    protocol: Option<Protocol>,
    /// Bytes written to each new TCP connection
    #[arg(long)]
    greeting: Option<String>,
    /// Print the recorded requests as JSON on shutdown
    #[arg(long)]
    dump_requests: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RecorderConfig> {
        let mut config = match &self.config {
            Some(path) => RecorderConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {path}"))?,
            None => RecorderConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if self.greeting.is_some() {
            config.greeting = self.greeting;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dump_requests = args.dump_requests;
    let config = args.into_config()?;

    let requests = match config.protocol {
        Protocol::Http => {
            let recorder = HttpRecorder::new(config);
            let addr = recorder.start().await.context("Failed to start HTTP recorder")?;
            info!("HTTP recorder ready at http://{}", addr);
            wait_for_shutdown().await;
            recorder.stop().await;
            recorder.requests()
        }
        Protocol::Tcp => {
            let recorder = TcpRecorder::new(config);
            let addr = recorder.start().await.context("Failed to start TCP recorder")?;
            info!("TCP recorder ready at {}", addr);
            wait_for_shutdown().await;
            recorder.stop().await;
            recorder.requests()
        }
    };

    info!("Recorded {} requests", requests.len());
    if dump_requests {
        print_requests(&requests)?;
    }
    Ok(())
}

async fn wait_for_shutdown() {
    tokio::signal::ctrl_c().await.ok();
}

fn print_requests(requests: &[RecordedRequest]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(requests).context("Failed to serialize requests")?;
    println!("{json}");
    Ok(())
}
