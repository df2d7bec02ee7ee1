#![allow(clippy::too_many_arguments, clippy::result_large_err)]

use {
  self::{
    arguments::Arguments,
    error::{ResultExt, SnafuError},
    index::{
      Stage,
      entry::{
        BalanceEntry, Delta, Drc20TransferEntry, Entry, InscriptionEntry, InscriptionTransferEntry,
        OutputEntry, Status, TokenEntry, TransactionEntry,
      },
    },
    provider::{BlockData, DataProvider, OutputValue, TransactionData},
    store::{Staged, Store, StoreRead},
    subcommand::{OutputFormat, Subcommand, SubcommandResult},
  },
  anyhow::{Context, Error, anyhow, bail},
  bitcoin::{OutPoint, Txid, hashes::Hash},
  chrono::{DateTime, TimeZone, Utc},
  clap::{Parser, ValueEnum},
  drc20::{Decimal, MAX_LITERAL_LENGTH, Operation, TransferKind},
  serde::{Deserialize, Serialize, de::DeserializeOwned},
  serde_with::{DeserializeFromStr, SerializeDisplay},
  snafu::{Backtrace, Snafu},
  std::{
    collections::{BTreeMap, HashMap},
    env,
    ffi::OsString,
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    sync::{
      Arc, Mutex, MutexGuard,
      atomic::{self, AtomicBool},
    },
    thread,
    time::{Duration, Instant},
  },
};

pub use self::{
  chain::Chain,
  index::{Index, STARTUP},
  inscription_id::InscriptionId,
  options::Options,
  settings::Settings,
};

pub mod arguments;
pub mod chain;
pub mod error;
pub mod index;
pub mod inscription_id;
pub mod options;
pub mod pipeline;
pub mod provider;
pub mod settings;
pub mod store;
pub mod subcommand;

type Result<T = (), E = Error> = std::result::Result<T, E>;
type SnafuResult<T = (), E = SnafuError> = std::result::Result<T, E>;

static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Sleeps for `duration`, returning early once shutdown has been requested.
fn pause(duration: Duration) {
  let deadline = Instant::now() + duration;

  while !SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
    let now = Instant::now();

    if now >= deadline {
      break;
    }

    thread::sleep((deadline - now).min(Duration::from_millis(100)));
  }
}

pub fn main() {
  env_logger::init();

  if let Err(err) = ctrlc::set_handler(move || {
    if SHUTTING_DOWN.fetch_or(true, atomic::Ordering::Relaxed) {
      process::exit(1);
    }

    eprintln!("Shutting down gracefully. Press <CTRL-C> again to shutdown immediately.");
  }) {
    log::warn!("failed to set <CTRL-C> handler: {err}");
  }

  let args = Arguments::parse();

  let format = args.options.format;

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");

      if let SnafuError::Anyhow { err } = err {
        for (i, err) in err.chain().skip(1).enumerate() {
          if i == 0 {
            eprintln!();
            eprintln!("because:");
          }

          eprintln!("- {err}");
        }

        if env::var_os("RUST_BACKTRACE")
          .map(|val| val == "1")
          .unwrap_or_default()
        {
          eprintln!("{}", err.backtrace());
        }
      }

      process::exit(1);
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print(format.unwrap_or_default());
      }
    }
  }
}
