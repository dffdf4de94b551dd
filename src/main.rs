use std::fs::File;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use keyfetch::config::{self, CliOverrides, KeyfetchConfig};
use keyfetch::models::Group;
use keyfetch::network::{
    DouBanApi, Dispatcher, FetchResult, HttpMethod, HttpTransport, JsonDecoder,
};
use serde_json::Value;
use simplelog::{ConfigBuilder, WriteLogger};
use tokio::sync::oneshot;

#[derive(Clone, Debug, Default, ValueEnum)]
enum EndpointArg {
    #[default]
    Channels,
    Playlist,
    Invalid,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum MethodArg {
    #[default]
    Get,
    Post,
}

impl From<MethodArg> for HttpMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Get => HttpMethod::Get,
            MethodArg::Post => HttpMethod::Post,
        }
    }
}

#[derive(Parser)]
#[command(name = "keyfetch", about = "Fetch and decode Douban FM API responses")]
struct Args {
    /// Endpoint to call
    #[arg(short, long, default_value_t, value_enum)]
    endpoint: EndpointArg,

    /// Channel id for the playlist endpoint
    #[arg(short, long, default_value_t = 10)]
    channel: u32,

    /// Dotted path into the response, e.g. "groups" or "data.items".
    /// Given explicitly, the raw value at the path is printed.
    #[arg(short, long)]
    key_path: Option<String>,

    /// HTTP method
    #[arg(short, long, default_value_t, value_enum)]
    method: MethodArg,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

/// Waits for a completion-style dispatch to report back.
async fn completion_channel<T>(
    start: impl FnOnce(Box<dyn FnOnce(FetchResult<T>) + Send>),
) -> Result<FetchResult<T>, oneshot::error::RecvError>
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    start(Box::new(move |result| {
        let _ = tx.send(result);
    }));
    rx.await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("{e}; falling back to defaults");
        KeyfetchConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            timeout_secs: args.timeout,
            log_level: args.log_level.clone(),
        },
    );

    // Initialize file logger
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("keyfetch starting: endpoint={:?}", args.endpoint);

    let transport = HttpTransport::with_options(&resolved.http)?;
    let dispatcher = Dispatcher::new(Arc::new(transport));
    let method = HttpMethod::from(args.method);

    let api = match args.endpoint {
        EndpointArg::Channels => DouBanApi::Channels,
        EndpointArg::Playlist => DouBanApi::Playlist {
            channel: args.channel,
        },
        EndpointArg::Invalid => DouBanApi::InvalidUrl,
    };
    let endpoint = resolved.douban.endpoint(api);

    match (api, args.key_path) {
        (DouBanApi::Channels, None) => {
            let groups: Vec<Group> = completion_channel(|done| {
                dispatcher.fetch_json_array(
                    &endpoint,
                    method,
                    "groups",
                    JsonDecoder::<Group>::new(),
                    done,
                );
            })
            .await??;

            for group in groups {
                println!(
                    "{} ({})",
                    group.group_name.as_deref().unwrap_or("unnamed"),
                    group.group_id
                );
                for channel in group.chls {
                    println!("  {:>6}  {}", channel.id, channel.name);
                }
            }
        }
        (api, key_path) => {
            let key_path = key_path.unwrap_or_else(|| match api {
                DouBanApi::Playlist { .. } => "song".to_string(),
                DouBanApi::Channels | DouBanApi::InvalidUrl => String::new(),
            });
            let value: Value = completion_channel(|done| {
                dispatcher.fetch_data(&endpoint, method, &key_path, done);
            })
            .await??;

            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
