use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(
    long,
    help = "Fetch <CATCH_UP_BATCH_SIZE> blocks in parallel during catch-up. [default: 100]"
  )]
  pub(crate) catch_up_batch_size: Option<u32>,
  #[arg(
    long,
    help = "Retry each catch-up block up to <CATCH_UP_RETRIES> times. [default: 1000]"
  )]
  pub(crate) catch_up_retries: Option<u32>,
  #[arg(long = "chain", value_enum, help = "Use <CHAIN>. [default: dogecoin]")]
  pub(crate) chain_argument: Option<Chain>,
  #[arg(long, help = "Load configuration from <CONFIG>.")]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Load configuration from <CONFIG_DIR>.")]
  pub(crate) config_dir: Option<PathBuf>,
  #[arg(long, alias = "datadir", help = "Store index in <DATA_DIR>.")]
  pub(crate) data_dir: Option<PathBuf>,
  #[arg(long, help = "Stop every stage after <END_BLOCK>.")]
  pub(crate) end_block: Option<u32>,
  #[arg(long, help = "Fetch block data from the explorer at <EXPLORER_URL>.")]
  pub(crate) explorer_url: Option<String>,
  #[arg(
    long,
    help = "Wait <FAILURE_WAIT_MS> milliseconds before retrying a failed block. [default: 5000]"
  )]
  pub(crate) failure_wait_ms: Option<u64>,
  #[clap(long, short, help = "Specify output format. [default: json]")]
  pub(crate) format: Option<OutputFormat>,
  #[arg(long, help = "Keep the index in memory instead of writing it to disk.")]
  pub(crate) in_memory: bool,
  #[arg(long, help = "Use index at <INDEX>.")]
  pub(crate) index: Option<PathBuf>,
  #[arg(
    long,
    help = "Wait for the explorer to report inscriptions for blocks above <INSCRIPTION_WAIT_HEIGHT>. [default: chain dependent]"
  )]
  pub(crate) inscription_wait_height: Option<u32>,
  #[arg(
    long,
    help = "Wait <INSCRIPTION_WAIT_MS> milliseconds for the explorer to catch up on inscriptions. [default: 10000]"
  )]
  pub(crate) inscription_wait_ms: Option<u64>,
  #[arg(
    long,
    help = "Wait <LAG_WAIT_MS> milliseconds before rechecking a lagging upstream stage. [default: 10000]"
  )]
  pub(crate) lag_wait_ms: Option<u64>,
  #[arg(
    long,
    help = "Remember at most <OUTPUT_CACHE_SIZE> outputs fetched from the explorer. [default: 100000]"
  )]
  pub(crate) output_cache_size: Option<usize>,
  #[arg(
    long = "protocol",
    help = "Accept token inscriptions declaring protocol <PROTOCOL>. May be repeated. [default: drc-20]"
  )]
  pub(crate) protocols: Vec<String>,
  #[arg(long, help = "Retry explorer requests up to <PROVIDER_RETRIES> times. [default: 1000]")]
  pub(crate) provider_retries: Option<u32>,
  #[arg(
    long,
    help = "Wait <PROVIDER_RETRY_INTERVAL_MS> milliseconds between explorer retries. [default: 1000]"
  )]
  pub(crate) provider_retry_interval_ms: Option<u64>,
  #[arg(long, short, help = "Use regtest. Equivalent to `--chain dogecoin-regtest`.")]
  pub(crate) regtest: bool,
  #[arg(
    long,
    help = "Stay at least <SLOW_DOWN> blocks behind the chain head to react to reorgs."
  )]
  pub(crate) slow_down: Option<u32>,
  #[arg(
    long,
    help = "Keep each stage <STAGE_LAG> blocks behind its upstream stage. [default: 2]"
  )]
  pub(crate) stage_lag: Option<u32>,
  #[arg(
    long,
    help = "Start indexing at <START_BLOCK>. [default: first inscription height]"
  )]
  pub(crate) start_block: Option<u32>,
  #[arg(long, help = "Begin catch-up at <STARTUP_BLOCK>. [default: start block]")]
  pub(crate) startup_block: Option<u32>,
  #[arg(long, short, help = "Use testnet. Equivalent to `--chain dogecoin-testnet`.")]
  pub(crate) testnet: bool,
}
