use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use proxy_checker::proxy::{
    ChannelProcessor, CheckerConfig, ProxyChecker, ProxyList, ProxyParser, ProxyType,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A concurrent proxy checker with capability inference
#[derive(Parser)]
#[command(name = "proxy-checker")]
#[command(about = "A concurrent proxy checker with capability inference")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a text proxy list
    Parse {
        /// Input file containing proxies
        input: PathBuf,
        /// Save parsed proxies as a JSON proxy list
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Scheme for entries without one (http, https, socks4, socks5)
        #[arg(short, long, default_value = "http")]
        scheme: String,
    },
    /// Check proxies and save their updated state
    Check {
        /// JSON proxy list, or a text proxy list
        input: PathBuf,
        /// Output JSON file (defaults to the input when it is a JSON list)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Scheme for text entries without one (http, https, socks4, socks5)
        #[arg(short, long, default_value = "http")]
        scheme: String,
        /// Number of concurrent checks
        #[arg(short = 'n', long, default_value = "10")]
        pool_size: usize,
        /// Timeout in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,
        /// Never probe plain HTTP
        #[arg(long)]
        no_http_check: bool,
        /// Never probe HTTPS unless forced
        #[arg(long)]
        no_https_check: bool,
        /// Probe HTTPS even for proxies not known to support it
        #[arg(long)]
        https_force_check: bool,
        /// Extra attempts for a failed probe
        #[arg(long, default_value = "0")]
        max_retries: usize,
        /// Milliseconds between probe attempts
        #[arg(long, default_value = "0")]
        retry_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Parse {
            input,
            output,
            scheme,
        } => {
            let list: ProxyList = ProxyParser::parse_file(&input, parse_scheme(&scheme)?)?
                .into_iter()
                .collect();
            println!("Parsed {} proxies from {:?}", list.len(), input);

            if let Some(output_path) = output {
                list.save(&output_path)?;
                println!("Saved parsed proxies to {:?}", output_path);
            } else {
                for proxy in list.proxies() {
                    println!("{}", proxy);
                }
            }
        }
        Commands::Check {
            input,
            output,
            scheme,
            pool_size,
            timeout,
            no_http_check,
            no_https_check,
            https_force_check,
            max_retries,
            retry_timeout,
        } => {
            let list = load_proxies(&input, parse_scheme(&scheme)?)?;
            let output = match output {
                Some(path) => path,
                None if is_json(&input) => input.clone(),
                None => return Err(anyhow!("--output is required for text proxy lists")),
            };

            println!("Loaded {} proxies from {:?}", list.len(), input);
            println!("Checking with {} workers, timeout: {}s", pool_size, timeout);

            let config = CheckerConfig::new()
                .with_pool_size(pool_size)
                .with_timeout(Duration::from_secs(timeout))
                .with_http_check(!no_http_check)
                .with_https_check(!no_https_check)
                .with_https_force_check(https_force_check)
                .with_retries(max_retries, Duration::from_millis(retry_timeout));

            let (processor, mut checked) = ChannelProcessor::new();
            let checker = ProxyChecker::with_config(config).with_processor(Arc::new(processor));

            let total = list.len();
            let reporter = tokio::spawn(async move {
                let mut done = 0;
                while let Some(proxy) = checked.recv().await {
                    done += 1;
                    let status = if proxy.is_healthy() { "good" } else { "bad" };
                    info!("[{}/{}] {} {}", done, total, proxy, status);
                }
            });

            let (list, outcome) = checker.check_list(list).await;
            drop(checker);
            reporter.await?;

            let good = list.healthy().count();
            println!("Results: {} good, {} bad", good, list.len() - good);

            list.save(&output)?;
            println!("Saved proxy list to {:?}", output);
            outcome?;
        }
    }

    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load_proxies(path: &Path, scheme: ProxyType) -> Result<ProxyList> {
    if is_json(path) {
        ProxyList::load(path)
    } else {
        Ok(ProxyParser::parse_file(path, scheme)?.into_iter().collect())
    }
}

fn parse_scheme(s: &str) -> Result<ProxyType> {
    ProxyType::from_scheme(s)
        .ok_or_else(|| anyhow!("Invalid proxy type: {}. Use: http, https, socks4, socks5", s))
}
