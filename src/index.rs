use {
  self::updater::Updater,
  super::*,
  crate::{
    provider::{Explorer, OutputCache, with_retries},
    store::{MemoryStore, RedbStore},
  },
};

pub mod entry;

mod balances;
mod inscriptions;
mod outputs;
mod status;
mod tokens;
mod transactions;
mod transfers;
mod updater;

/// Checkpoint advanced by catch-up.
pub const STARTUP: &str = "startup";

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Stage {
  FetchBlocks,
  InscriptionTransfers,
  Drc20,
}

impl Stage {
  pub const ALL: [Self; 3] = [Self::FetchBlocks, Self::InscriptionTransfers, Self::Drc20];

  /// Name of the stage's checkpoint.
  pub fn name(self) -> &'static str {
    match self {
      Self::FetchBlocks => "fetch-blocks",
      Self::InscriptionTransfers => "inscription-transfers",
      Self::Drc20 => "drc20",
    }
  }

  /// Stage whose output this stage consumes.
  pub fn upstream(self) -> Option<Self> {
    match self {
      Self::FetchBlocks => None,
      Self::InscriptionTransfers => Some(Self::FetchBlocks),
      Self::Drc20 => Some(Self::InscriptionTransfers),
    }
  }
}

impl Display for Stage {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

pub struct Index {
  output_cache: OutputCache,
  provider: Option<Arc<dyn DataProvider>>,
  settings: Settings,
  store: Arc<dyn Store>,
}

impl Index {
  /// Opens the configured store. The explorer is only required by stages that
  /// fetch chain data.
  pub fn open(settings: &Settings) -> Result<Self> {
    let store: Arc<dyn Store> = if settings.in_memory() {
      log::info!("keeping index in memory");
      Arc::new(MemoryStore::default())
    } else {
      let path = settings
        .index()
        .context("no index path configured, use `--index` or `--data-dir`")?;
      Arc::new(RedbStore::open(path)?)
    };

    let provider = match settings.explorer_url() {
      Ok(url) => Some(Arc::new(Explorer::new(url)?) as Arc<dyn DataProvider>),
      Err(_) => None,
    };

    Ok(Self {
      output_cache: OutputCache::new(settings.output_cache_size()),
      provider,
      settings: settings.clone(),
      store,
    })
  }

  pub fn new(settings: Settings, store: Arc<dyn Store>, provider: Arc<dyn DataProvider>) -> Self {
    Self {
      output_cache: OutputCache::new(settings.output_cache_size()),
      provider: Some(provider),
      settings,
      store,
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn store(&self) -> &dyn Store {
    self.store.as_ref()
  }

  fn provider(&self) -> Result<&dyn DataProvider> {
    match &self.provider {
      Some(provider) => Ok(provider.as_ref()),
      None => {
        self.settings.explorer_url()?;
        Err(anyhow!("no data provider configured"))
      }
    }
  }

  pub fn checkpoint(&self, name: &str) -> Result<Option<u32>> {
    status::get(self.store(), name)
  }

  pub fn set_checkpoint(&self, name: &str, block: u32) -> Result {
    let mut staged = Staged::new(self.store());
    status::set(&mut staged, name, block)?;
    staged.commit()
  }

  /// Runs `stage` over `height` and advances the stage's checkpoint in the
  /// same batch.
  pub fn index_block(&self, stage: Stage, height: u32) -> Result {
    Updater::new(self, height).update(stage, Some(stage.name()))
  }

  /// Fetches and stores a block without touching any checkpoint. Used by
  /// catch-up, which fetches many blocks concurrently.
  pub fn fetch_block_unchecked(&self, height: u32) -> Result {
    Updater::new(self, height).update(Stage::FetchBlocks, None)
  }

  pub(crate) fn chain_head(&self) -> Result<u32> {
    let provider = self.provider()?;

    with_retries(
      self.settings.provider_retries(),
      self.settings.provider_retry_interval(),
      || "fetch chain head".into(),
      || provider.chain_head(),
    )
  }

  pub(crate) fn fetch_block(&self, height: u32) -> Result<BlockData> {
    let provider = self.provider()?;

    with_retries(
      self.settings.provider_retries(),
      self.settings.provider_retry_interval(),
      || format!("fetch block {height}"),
      || provider.block(height),
    )
  }

  /// Value and address of an output not indexed locally, as reported by the
  /// provider.
  pub(crate) fn resolve_output(&self, outpoint: OutPoint) -> Result<Option<OutputValue>> {
    if let Some(value) = self.output_cache.get(outpoint)? {
      return Ok(Some(value));
    }

    let provider = self.provider()?;

    let value = with_retries(
      self.settings.provider_retries(),
      self.settings.provider_retry_interval(),
      || format!("fetch output {outpoint}"),
      || provider.output(outpoint),
    )?;

    if let Some(value) = &value {
      self.output_cache.insert(outpoint, value.clone())?;
    }

    Ok(value)
  }

  pub fn token(&self, tick: &str) -> Result<Option<TokenEntry>> {
    tokens::get(self.store(), &tick.to_lowercase())
  }

  pub fn tokens(&self) -> Result<Vec<TokenEntry>> {
    tokens::all(self.store())
  }

  pub fn holders(&self, tick: &str) -> Result<u64> {
    tokens::holders(self.store(), &tick.to_lowercase())
  }

  pub fn balance(&self, address: &str, tick: &str) -> Result<Option<BalanceEntry>> {
    balances::get(self.store(), address, &tick.to_lowercase())
  }

  pub fn balances(&self, address: &str) -> Result<Vec<BalanceEntry>> {
    balances::for_address(self.store(), address)
  }

  pub fn tick_balances(&self, tick: &str) -> Result<Vec<BalanceEntry>> {
    balances::for_tick(self.store(), &tick.to_lowercase())
  }

  pub fn drc20_transfers(&self, inscription: InscriptionId) -> Result<Vec<Drc20TransferEntry>> {
    transfers::all(self.store(), inscription)
  }

  pub fn received(&self, address: &str) -> Result<Vec<Drc20TransferEntry>> {
    transfers::received(self.store(), address)
  }

  pub fn sent(&self, address: &str) -> Result<Vec<Drc20TransferEntry>> {
    transfers::sent(self.store(), address)
  }

  pub fn inscription(&self, id: InscriptionId) -> Result<Option<InscriptionEntry>> {
    inscriptions::get(self.store(), id)
  }

  pub fn inscription_transfers(&self, height: u32) -> Result<Vec<InscriptionTransferEntry>> {
    inscriptions::transfers_for_block(self.store(), height)
  }

  pub fn output(&self, outpoint: OutPoint) -> Result<Option<OutputEntry>> {
    outputs::get(self.store(), outpoint)
  }

  pub fn original_address(&self, address: &str) -> Result<Option<String>> {
    outputs::address(self.store(), address)
  }

  pub fn transactions(&self, height: u32) -> Result<Vec<TransactionEntry>> {
    transactions::for_block(self.store(), height)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test::*, pretty_assertions::assert_eq};

  #[test]
  fn stages() {
    assert_eq!(
      Stage::ALL.map(Stage::name),
      ["fetch-blocks", "inscription-transfers", "drc20"]
    );
    assert_eq!(Stage::FetchBlocks.upstream(), None);
    assert_eq!(Stage::Drc20.upstream(), Some(Stage::InscriptionTransfers));
    assert_eq!(
      Stage::from_str("inscription-transfers", false).unwrap(),
      Stage::InscriptionTransfers
    );
  }

  #[test]
  fn checkpoints() {
    let index = index(MockProvider::default());

    assert_eq!(index.checkpoint(STARTUP).unwrap(), None);
    index.set_checkpoint(STARTUP, 7).unwrap();
    assert_eq!(index.checkpoint(STARTUP).unwrap(), Some(7));
  }

  #[test]
  fn status_requires_no_provider() {
    let tempdir = tempfile::tempdir().unwrap();

    let settings = settings(&["--data-dir", tempdir.path().to_str().unwrap()]);

    let index = Index::open(&settings).unwrap();

    assert_eq!(index.checkpoint(Stage::Drc20.name()).unwrap(), None);
    assert_eq!(
      index.chain_head().unwrap_err().to_string(),
      "invalid configuration: no explorer url configured, use `--explorer-url`"
    );
  }

  #[test]
  fn resolved_outputs_are_cached() {
    let provider = MockProvider::default();
    provider.add_output(
      outpoint(1, 0),
      OutputValue {
        value: 50,
        address: Some("DAlice".into()),
      },
    );

    let index = index(provider.clone());

    assert_eq!(index.resolve_output(outpoint(1, 0)).unwrap().unwrap().value, 50);
    assert_eq!(index.resolve_output(outpoint(1, 0)).unwrap().unwrap().value, 50);
    assert_eq!(index.resolve_output(outpoint(2, 0)).unwrap(), None);
    assert_eq!(provider.output_requests(), 2);
  }
}
