// ABOUTME: CLI binary for ptgen.
// ABOUTME: Builds a Query from flags, runs it through the Gateway and prints the description or the JSON envelope.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use ptgen_core::{Client, Envelope, Gateway, GatewayOptions, Query};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ptgen")]
#[command(about = "Generate BBCode descriptions from douban, IMDb, Bangumi, Steam, indienova and Epic")]
struct Args {
    /// Resource URL to resolve (takes precedence over --site/--sid)
    #[arg(long = "url")]
    url: Option<String>,

    /// Site tag: douban, imdb, bangumi, steam, indienova, epic
    #[arg(long = "site")]
    site: Option<String>,

    /// Subject id on the site
    #[arg(long = "sid")]
    sid: Option<String>,

    /// Search keywords instead of generating a description
    #[arg(long = "search")]
    search: Option<String>,

    /// Search source site (default: douban)
    #[arg(long = "source")]
    source: Option<String>,

    /// Attach diagnostics to internal-error responses
    #[arg(long = "debug")]
    debug: bool,

    /// Output the full JSON envelope instead of the description
    #[arg(long = "json")]
    json_output: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Edge cache directory (default: no caching)
    #[arg(long = "cache-dir")]
    cache_dir: Option<PathBuf>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Upstream request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,
}

impl Args {
    fn query(&self) -> Query {
        Query {
            url: self.url.clone(),
            site: self.site.clone(),
            sid: self.sid.clone(),
            search: self.search.clone(),
            source: self.source.clone(),
            debug: self.debug,
        }
    }
}

/// Render the envelope for output.
///
/// Without `--json`, a description prints its `format`, a search prints its
/// `data` list as JSON, and a failure prints nothing.
fn format_output(envelope: &Envelope, json_output: bool) -> Result<Option<String>, serde_json::Error> {
    if json_output {
        return serde_json::to_string_pretty(envelope).map(Some);
    }
    if !envelope.success {
        return Ok(None);
    }
    match envelope.payload.get("data") {
        Some(data) => serde_json::to_string_pretty(data).map(Some),
        None => Ok(Some(envelope.format.clone())),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build();
    let gateway = Gateway::new(
        client,
        GatewayOptions {
            cache_dir: args.cache_dir.clone(),
            ..Default::default()
        },
    );

    let start = Instant::now();
    let envelope = gateway.handle(&args.query()).await;
    let elapsed = start.elapsed();

    let mut had_error = !envelope.success;
    if let Some(message) = &envelope.error {
        eprintln!("error: {}", message);
    }

    match format_output(&envelope, args.json_output) {
        Ok(Some(output_str)) => {
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output_str) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else {
                println!("{}", output_str);
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("error serializing output: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
