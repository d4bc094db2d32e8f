use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::chain::rpc::SolanaRpc;
use crate::chain::Cluster;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::gallery::{Gallery, GalleryOptions, DEFAULT_FALLBACK_IMAGE};
use crate::metadata::{HttpMetadataFetcher, MetadataFetcher};
use crate::output::{self, OutputFormat, PageReport};
use crate::pager::Direction;
use crate::records::RecordSource;
use crate::utils;

fn print_banner() {
    const BANNER: &str = r#"
        ______                                
  _____/ __/ /_____  ____ _____ ____  _____
 / __ \/ /_/ __/ __ \/ __ `/ __ `/ _ \/ ___/
/ / / / __/ /_/ /_/ / /_/ / /_/ /  __/ /    
/_/ /_/_/  \__/ .___/\__,_/\__, /\___/_/     
             /_/          /____/             
"#;
    eprint!("{}", BANNER.bold().magenta());
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RunConfig {
    owner: Option<String>,
    cluster: Cluster,
    rpc_url: String,
    page_size: NonZeroUsize,
    timeout: usize,
    fallback_image: String,
    format: OutputFormat,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let owner = args
        .owner
        .or(cfg.owner)
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());

    let cluster = match args.cluster.or(cfg.cluster) {
        Some(raw) => Cluster::parse(&raw).ok_or_else(|| {
            format!("invalid cluster '{raw}', expected mainnet-beta, devnet or testnet")
        })?,
        None => Cluster::MainnetBeta,
    };

    let rpc_url = match args.rpc_url.or(cfg.rpc_url) {
        Some(raw) => {
            let raw = raw.trim().to_string();
            validation::validate_rpc_url(&raw)
                .map_err(|e| format!("invalid rpc url '{raw}': {e}"))?;
            raw
        }
        None => cluster.rpc_url().to_string(),
    };

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(1);
    let page_size = NonZeroUsize::new(page_size)
        .ok_or_else(|| "invalid page-size, expected positive integer".to_string())?;

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(utils::DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let fallback_image = args
        .fallback_image
        .or(cfg.fallback_image)
        .unwrap_or_else(|| DEFAULT_FALLBACK_IMAGE.to_string());

    let format = match args.format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => OutputFormat::Text,
    };

    Ok(RunConfig {
        owner,
        cluster,
        rpc_url,
        page_size,
        timeout,
        fallback_image,
        format,
        no_color,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Page(Direction),
    Refetch,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        if let Some(direction) = Direction::parse(line) {
            return Some(Self::Page(direction));
        }
        match line.trim().to_lowercase().as_str() {
            "r" | "refetch" | "reload" => Some(Self::Refetch),
            "h" | "?" | "help" => Some(Self::Help),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn show_page<S: RecordSource>(gallery: &Gallery<S>, format: OutputFormat) {
    if let Some(report) = PageReport::from_gallery(gallery) {
        print!("{}", output::render(&report, format));
        let _ = std::io::stdout().flush();
    }
}

fn prompt<S: RecordSource>(gallery: &Gallery<S>) {
    let prev = if gallery.can_go_prev() {
        "[p]rev".bold().white()
    } else {
        "[p]rev".dimmed()
    };
    let next = if gallery.can_go_next() {
        "[n]ext".bold().white()
    } else {
        "[n]ext".dimmed()
    };
    eprint!("{prev} {next} [r]efetch [q]uit > ");
    let _ = std::io::stderr().flush();
}

async fn fetch_owner<S: RecordSource>(gallery: &mut Gallery<S>, owner: &str) -> bool {
    let pb = spinner(format!(
        "{} {}",
        "fetching NFTs ::".bold().white(),
        utils::short_address(owner).bold().blue()
    ));
    let result = gallery.fetch(owner).await;
    pb.finish_and_clear();
    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{} {}", "error:".bold().red(), e);
            false
        }
    }
}

async fn change_page<S: RecordSource>(gallery: &mut Gallery<S>, direction: Direction) -> bool {
    let enabled = match direction {
        Direction::Prev => gallery.can_go_prev(),
        Direction::Next => gallery.can_go_next(),
    };
    if !enabled {
        let edge = match direction {
            Direction::Prev => "already on the first page",
            Direction::Next => "already on the last page",
        };
        eprintln!("{}", edge.yellow());
        return false;
    }
    let pb = spinner(format!("{}", "loading page ::".bold().white()));
    let changed = gallery.change_page(direction).await;
    pb.finish_and_clear();
    changed
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let owner = run.owner.clone().ok_or_else(|| {
        "an owner address is required (use --owner or set 'owner' in the config file)".to_string()
    })?;

    format_kv_line("Owner", &owner);
    format_kv_line("Cluster", run.cluster.label());
    format_kv_line("RPC", &run.rpc_url);
    format_kv_line("Page size", &run.page_size.to_string());
    eprintln!();

    let client = utils::build_http_client(run.timeout)
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;
    let fetcher: Arc<dyn MetadataFetcher> = Arc::new(HttpMetadataFetcher::new(client.clone()));
    let rpc = SolanaRpc::new(client, run.rpc_url.clone(), fetcher);
    let mut gallery = Gallery::new(
        rpc,
        GalleryOptions {
            page_size: run.page_size,
            fallback_image: run.fallback_image.clone(),
        },
    );

    if !fetch_owner(&mut gallery, &owner).await {
        return Err(format!("could not load NFTs for {owner}"));
    }
    show_page(&gallery, run.format);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&gallery);
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read command: {e}")),
        };
        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(Command::Page(direction)) => {
                if change_page(&mut gallery, direction).await {
                    show_page(&gallery, run.format);
                }
            }
            Some(Command::Refetch) => {
                if fetch_owner(&mut gallery, &owner).await {
                    show_page(&gallery, run.format);
                }
            }
            Some(Command::Help) => {
                eprintln!("n/next: next page, p/prev: previous page, r/refetch: reload, q/quit: exit");
            }
            None if line.trim().is_empty() => {}
            None => eprintln!("{} '{}'", "unknown command".yellow(), line.trim()),
        }
    }

    eprintln!();
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "nftpager=warn",
        1 => "nftpager=info",
        _ => "nftpager=debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let explicit_config = args.config.as_deref().map(config::expand_tilde);
    if args.init_config {
        let path = explicit_config
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path, pass --config".to_string())?;
        let written = config::ensure_default_config_file(&path).map_err(|e| e.to_string())?;
        if written {
            println!("wrote default config to {}", path.display());
        } else {
            println!("config already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = match explicit_config {
        Some(path) => config::load_config(&path, false).map_err(|e| e.to_string())?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true).map_err(|e| e.to_string())?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
