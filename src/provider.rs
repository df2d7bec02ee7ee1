use super::*;

pub use self::explorer::Explorer;

mod explorer;

/// A block as reported by a data provider, transactions in confirmation
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockData {
  pub height: u32,
  pub timestamp: DateTime<Utc>,
  pub transactions: Vec<TransactionData>,
}

impl BlockData {
  pub fn has_inscriptions(&self) -> bool {
    self
      .transactions
      .iter()
      .any(|transaction| transaction.genesis_inscription.is_some())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionData {
  pub txid: Txid,
  pub inputs: Vec<OutPoint>,
  pub outputs: Vec<OutputData>,
  pub genesis_inscription: Option<GenesisInscription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputData {
  pub outpoint: OutPoint,
  pub value: u64,
  pub address: Option<String>,
}

/// An inscription created by a transaction. `content` is `None` when the
/// provider serves no textual content for it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisInscription {
  pub id: InscriptionId,
  pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
  pub value: u64,
  pub address: Option<String>,
}

/// Source of raw chain data.
pub trait DataProvider: Send + Sync {
  fn chain_head(&self) -> Result<u32>;

  fn block(&self, height: u32) -> Result<BlockData>;

  /// Value and address of an output, or `None` if the provider does not know
  /// it.
  fn output(&self, outpoint: OutPoint) -> Result<Option<OutputValue>>;
}

/// Calls `f` until it succeeds, at most `attempts` times, pausing `interval`
/// between attempts.
pub(crate) fn with_retries<T>(
  attempts: u32,
  interval: Duration,
  description: impl Fn() -> String,
  mut f: impl FnMut() -> Result<T>,
) -> Result<T> {
  let mut attempt = 1;

  loop {
    match f() {
      Ok(value) => return Ok(value),
      Err(err) if attempt >= attempts || SHUTTING_DOWN.load(atomic::Ordering::Relaxed) => {
        return Err(err.context(format!(
          "failed to {} after {attempt} attempts",
          description()
        )));
      }
      Err(err) => {
        log::warn!(
          "failed to {}, attempt {attempt}/{attempts}: {err}",
          description()
        );
        attempt += 1;
        pause(interval);
      }
    }
  }
}

/// Memoizes provider output lookups. The cache is dropped wholesale once it
/// holds `capacity` entries.
pub(crate) struct OutputCache {
  capacity: usize,
  outputs: Mutex<HashMap<OutPoint, OutputValue>>,
}

impl OutputCache {
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      capacity,
      outputs: Mutex::new(HashMap::new()),
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<OutPoint, OutputValue>>> {
    self
      .outputs
      .lock()
      .map_err(|_| anyhow!("output cache lock poisoned"))
  }

  pub(crate) fn get(&self, outpoint: OutPoint) -> Result<Option<OutputValue>> {
    Ok(self.lock()?.get(&outpoint).cloned())
  }

  pub(crate) fn insert(&self, outpoint: OutPoint, value: OutputValue) -> Result {
    let mut outputs = self.lock()?;

    if outputs.len() >= self.capacity {
      log::debug!("clearing output cache of {} entries", outputs.len());
      outputs.clear();
    }

    outputs.insert(outpoint, value);

    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.outputs.lock().map(|outputs| outputs.len()).unwrap_or_default()
  }
}
