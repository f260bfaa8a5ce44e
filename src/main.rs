use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use factorlib::{parse, schema, Dataset, FactorLibrary, FetchConfig, ParseOptions};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "factorlib", about = "Invespar India factor library reader")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// Provider root URL (default: $FACTORLIB_BASE_URL or https://invespar.com/)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Attempts per request on server errors
    #[arg(long, global = true)]
    max_attempts: Option<usize>,
    /// Blocks at least this many characters long are always tables
    #[arg(long, global = true, default_value_t = factorlib::config::DEFAULT_NARRATIVE_MAX_LEN)]
    narrative_max_len: usize,
}

#[derive(Args)]
struct OutputOpts {
    /// Print each dataset as JSON instead of its description
    #[arg(long)]
    json: bool,
    /// Write `<out>/<symbol>/<n>.parquet` and `DESCR.txt`
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List published symbols
    List,
    /// Download and parse one or more symbols
    Read {
        #[arg(required = true)]
        symbols: Vec<String>,
        /// Concurrent downloads
        #[arg(short = 'j', long, default_value = "3")]
        concurrency: usize,
        #[command(flatten)]
        output: OutputOpts,
    },
    /// Parse a previously downloaded export
    Parse {
        file: PathBuf,
        /// Symbol the file was downloaded as (selects the header layout)
        #[arg(short, long)]
        symbol: Option<String>,
        #[command(flatten)]
        output: OutputOpts,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let cli = Cli::parse();
    let mut fetch_cfg = FetchConfig::from_env();
    if let Some(base) = &cli.opts.base_url {
        fetch_cfg = fetch_cfg.with_base_url(base);
    }
    if let Some(n) = cli.opts.max_attempts {
        fetch_cfg.max_attempts = n.max(1);
    }
    let parse_opts = ParseOptions {
        narrative_max_len: cli.opts.narrative_max_len,
        ..ParseOptions::default()
    };

    match cli.command {
        Commands::List => {
            let lib = FactorLibrary::new(fetch_cfg, parse_opts)?;
            let symbols = lib.list_symbols().await.context("listing symbols")?;
            info!("{} symbols published", symbols.len());
            for s in symbols {
                println!("{}", s);
            }
            Ok(())
        }
        Commands::Read {
            symbols,
            concurrency,
            output,
        } => {
            let lib = Arc::new(FactorLibrary::new(fetch_cfg, parse_opts)?);
            read_symbols(lib, symbols, concurrency, &output).await
        }
        Commands::Parse {
            file,
            symbol,
            output,
        } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let symbol = symbol.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default()
            });
            let ds = parse(&symbol, &raw, &parse_opts)
                .with_context(|| format!("parsing {}", file.display()))?;
            emit(&symbol, &ds, &output)
        }
    }
}

async fn read_symbols(
    lib: Arc<FactorLibrary>,
    symbols: Vec<String>,
    concurrency: usize,
    output: &OutputOpts,
) -> Result<()> {
    // ─── download with bounded concurrency ──────────────────────────
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let lib = lib.clone();
        let sem = sem.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await?;
            let raw = lib.fetch(&symbol).await;
            anyhow::Ok((symbol, raw))
        }));
    }

    let mut downloaded = Vec::with_capacity(handles.len());
    let mut failures = 0;
    for h in handles {
        match h.await?? {
            (symbol, Ok(raw)) => downloaded.push((symbol, raw)),
            (symbol, Err(e)) => {
                error!(symbol = %symbol, "download failed: {}", e);
                failures += 1;
            }
        }
    }

    // ─── parse on the rayon pool ─────────────────────────────────────
    let opts = lib.parse_options().clone();
    let parsed: Vec<_> = downloaded
        .par_iter()
        .map(|(symbol, raw)| (symbol, parse(symbol, raw, &opts)))
        .collect();

    for (symbol, result) in parsed {
        match result {
            Ok(ds) => emit(symbol, &ds, output)?,
            Err(e) => {
                error!(symbol = %symbol, "parse failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} symbol(s) failed", failures);
    }
    Ok(())
}

fn emit(symbol: &str, ds: &Dataset, output: &OutputOpts) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(ds)?);
    } else {
        println!("== {}\n{}\n", symbol, ds.description);
    }
    if let Some(out) = &output.out {
        let dir: PathBuf = Path::new(out).join(symbol);
        let written = schema::write_dataset(ds, &dir)?;
        info!(symbol, files = written.len(), dir = %dir.display(), "wrote dataset");
    }
    Ok(())
}
