use super::*;

/// A record persisted as a JSON document.
pub(crate) trait Entry: Serialize + DeserializeOwned {
  fn load(value: &[u8]) -> Result<Self> {
    serde_json::from_slice(value)
      .with_context(|| format!("failed to decode {}", std::any::type_name::<Self>()))
  }

  fn store(&self) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(self)?)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
  pub txid: Txid,
  pub block_height: u32,
  pub index: u32,
  pub timestamp: DateTime<Utc>,
  pub inputs: Vec<OutPoint>,
  #[serde(default)]
  pub outputs_fetched: bool,
}

impl Entry for TransactionEntry {}

impl TransactionEntry {
  /// Coinbase transactions spend a single all-zero outpoint.
  pub fn is_coinbase(&self) -> bool {
    matches!(self.inputs.as_slice(), [input] if input.txid == Txid::all_zeros())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
  pub outpoint: OutPoint,
  pub value: u64,
  pub address: Option<String>,
  pub block_height: u32,
  pub transaction_index: u32,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub inscriptions: Vec<InscriptionId>,
}

impl Entry for OutputEntry {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InscriptionEntry {
  pub id: InscriptionId,
  pub genesis_tx: Txid,
  pub content: Option<String>,
}

impl Entry for InscriptionEntry {}

/// Movement of an inscription into a transaction output, or its creation
/// when `is_genesis` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InscriptionTransferEntry {
  pub inscription: InscriptionId,
  pub tx_id: Txid,
  pub input_index: u32,
  pub block_height: u32,
  pub transaction_index: u32,
  pub sender: Option<String>,
  pub receiver: Option<String>,
  pub is_genesis: bool,
}

impl Entry for InscriptionTransferEntry {}

impl InscriptionTransferEntry {
  /// Input index recorded for genesis transfers, which have no input.
  pub const GENESIS_INPUT: u32 = u32::MAX;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
  pub tick: String,
  pub max: Decimal,
  pub lim: Decimal,
  pub current_supply: Decimal,
  pub p: String,
  pub tx_id: Txid,
  pub inscription: InscriptionId,
  pub block_height: u32,
  pub transaction_index: u32,
}

impl Entry for TokenEntry {}

impl TokenEntry {
  pub fn remaining(&self) -> Decimal {
    self
      .max
      .checked_sub(self.current_supply)
      .unwrap_or(Decimal::ZERO)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
  pub tick: String,
  pub address: String,
  pub available: Decimal,
  pub transferable: Decimal,
}

impl Entry for BalanceEntry {}

impl BalanceEntry {
  pub fn is_empty(&self) -> bool {
    self.available.is_zero() && self.transferable.is_zero()
  }
}

/// Signed balance change recorded on a ledger event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum Delta {
  Credit(Decimal),
  Debit(Decimal),
}

impl Delta {
  pub const NONE: Self = Self::Credit(Decimal::ZERO);
}

impl Display for Delta {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::Credit(amount) => write!(f, "{amount}"),
      Self::Debit(amount) if amount.is_zero() => write!(f, "{amount}"),
      Self::Debit(amount) => write!(f, "-{amount}"),
    }
  }
}

impl FromStr for Delta {
  type Err = drc20::DecimalError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.strip_prefix('-') {
      Some(amount) => Ok(Self::Debit(amount.parse()?)),
      None => Ok(Self::Credit(s.parse()?)),
    }
  }
}

/// Ledger outcome of one inscription transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drc20TransferEntry {
  pub inscription: InscriptionId,
  pub tx_id: Txid,
  pub block_height: u32,
  pub transaction_index: u32,
  pub sender: Option<String>,
  pub receiver: Option<String>,
  pub tick: String,
  pub kind: Option<TransferKind>,
  pub is_ignored: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason_for_ignore: Option<String>,
  pub available_balance_change: Delta,
  pub transferable_balance_change: Delta,
}

impl Entry for Drc20TransferEntry {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
  pub name: String,
  pub last_synced_block: u32,
}

impl Entry for Status {}
