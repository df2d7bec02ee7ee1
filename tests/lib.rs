use {
  bitcoin::{OutPoint, Txid},
  chrono::{TimeZone, Utc},
  clap::Parser,
  doge20::{
    Index, InscriptionId, Options, Settings,
    index::{Stage, entry::Delta},
    pipeline,
    provider::{BlockData, DataProvider, GenesisInscription, OutputData, OutputValue, TransactionData},
    store::{MemoryStore, RedbStore, Store},
  },
  std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
  },
};

mod command;

type Result<T = ()> = anyhow::Result<T>;

fn txid(n: u64) -> Txid {
  format!("{n:064x}").parse().unwrap()
}

fn outpoint(n: u64, vout: u32) -> OutPoint {
  OutPoint { txid: txid(n), vout }
}

fn inscription(n: u64) -> InscriptionId {
  InscriptionId::genesis(txid(n))
}

fn settings(args: &[&str]) -> Settings {
  let mut arguments = vec![
    "doge20",
    "--regtest",
    "--in-memory",
    "--data-dir",
    "data",
    "--provider-retries",
    "1",
    "--provider-retry-interval-ms",
    "0",
    "--inscription-wait-ms",
    "0",
    "--lag-wait-ms",
    "0",
    "--failure-wait-ms",
    "0",
  ];

  if !args.contains(&"--start-block") {
    arguments.extend(["--start-block", "1"]);
  }

  arguments.extend_from_slice(args);

  Settings::from_options(Options::try_parse_from(arguments).unwrap())
    .or_defaults()
    .unwrap()
}

/// Builds the blocks of a regtest chain, one transaction at a time.
#[derive(Clone, Default)]
struct Chain {
  state: Arc<Mutex<ChainState>>,
}

#[derive(Default)]
struct ChainState {
  blocks: BTreeMap<u32, BlockData>,
  outputs: HashMap<OutPoint, OutputValue>,
}

impl Chain {
  /// Appends transaction `n` spending `inputs` into outputs of `values` paid
  /// to `address`, inscribing `content` when given.
  fn transact(
    &self,
    height: u32,
    n: u64,
    inputs: &[OutPoint],
    values: &[u64],
    address: &str,
    content: Option<&str>,
  ) {
    let transaction = TransactionData {
      txid: txid(n),
      inputs: inputs.to_vec(),
      outputs: values
        .iter()
        .enumerate()
        .map(|(vout, value)| OutputData {
          outpoint: outpoint(n, u32::try_from(vout).unwrap()),
          value: *value,
          address: Some(address.into()),
        })
        .collect(),
      genesis_inscription: content.map(|content| GenesisInscription {
        id: inscription(n),
        content: Some(content.into()),
      }),
    };

    self
      .state
      .lock()
      .unwrap()
      .blocks
      .entry(height)
      .or_insert_with(|| BlockData {
        height,
        timestamp: Utc.timestamp_opt(i64::from(height) * 60, 0).unwrap(),
        transactions: Vec::new(),
      })
      .transactions
      .push(transaction);
  }

  fn inscribe(&self, height: u32, n: u64, address: &str, content: &str) {
    self.transact(height, n, &[outpoint(n + 1000, 0)], &[1000], address, Some(content));
  }

  /// Registers an output created outside the indexed range.
  fn external_output(&self, outpoint: OutPoint, value: u64) {
    self
      .state
      .lock()
      .unwrap()
      .outputs
      .insert(outpoint, OutputValue { value, address: None });
  }

  fn empty_block(&self, height: u32) {
    self.state.lock().unwrap().blocks.insert(
      height,
      BlockData {
        height,
        timestamp: Utc.timestamp_opt(i64::from(height) * 60, 0).unwrap(),
        transactions: Vec::new(),
      },
    );
  }

  fn index(&self, args: &[&str]) -> Index {
    self.index_on(Arc::new(MemoryStore::default()), args)
  }

  fn index_on(&self, store: Arc<dyn Store>, args: &[&str]) -> Index {
    Index::new(settings(args), store, Arc::new(self.clone()))
  }
}

impl DataProvider for Chain {
  fn chain_head(&self) -> Result<u32> {
    self
      .state
      .lock()
      .unwrap()
      .blocks
      .keys()
      .next_back()
      .copied()
      .ok_or_else(|| anyhow::anyhow!("empty chain"))
  }

  fn block(&self, height: u32) -> Result<BlockData> {
    self
      .state
      .lock()
      .unwrap()
      .blocks
      .get(&height)
      .cloned()
      .ok_or_else(|| anyhow::anyhow!("block {height} not mined"))
  }

  fn output(&self, outpoint: OutPoint) -> Result<Option<OutputValue>> {
    Ok(self.state.lock().unwrap().outputs.get(&outpoint).cloned())
  }
}

/// Runs every stage from the first block through `end`.
fn sync(chain: &Chain, end: u32) -> Arc<Index> {
  let index = Arc::new(chain.index(&["--end-block", &end.to_string()]));
  pipeline::run(index.clone(), &Stage::ALL).unwrap();
  index
}
