use super::*;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum SnafuError {
  #[snafu(display("transaction {txid} has no inputs"))]
  MissingInputs { txid: Txid },
  #[snafu(display("transaction {txid} has no outputs"))]
  MissingOutputs { txid: Txid },
  #[snafu(display("output {outpoint} of transaction {txid} not found"))]
  MissingOutput { outpoint: OutPoint, txid: Txid },
  #[snafu(display("output {outpoint} listed more than once for transaction {txid}"))]
  DuplicateOutput { outpoint: OutPoint, txid: Txid },
  #[snafu(display("input {outpoint} of transaction {txid} could not be resolved"))]
  UnresolvedOutput { outpoint: OutPoint, txid: Txid },
  #[snafu(display("output {outpoint} does not belong to transaction {txid}"))]
  OutputTransactionMismatch { outpoint: OutPoint, txid: Txid },
  #[snafu(display("output {outpoint} found at position {position}"))]
  OutputIndexMismatch { outpoint: OutPoint, position: usize },
  #[snafu(display("transaction {txid} has {outputs} outputs but {values} output values"))]
  OutputValueCount {
    txid: Txid,
    outputs: usize,
    values: usize,
  },
  #[snafu(display("inscription {inscription} appears more than once on output {outpoint}"))]
  DuplicateInscription {
    inscription: InscriptionId,
    outpoint: OutPoint,
  },
  #[snafu(display("inscription {inscription} does not match genesis transaction {genesis_tx}"))]
  InscriptionIdMismatch {
    inscription: InscriptionId,
    genesis_tx: Txid,
  },
  #[snafu(display("transfer of {inscription} in {tx_id} has no amount"))]
  MissingAmount { inscription: InscriptionId, tx_id: Txid },
  #[snafu(display("transfer of {inscription} in {tx_id} has no sender"))]
  MissingSender { inscription: InscriptionId, tx_id: Txid },
  #[snafu(display("inscription {inscription} has {count} valid prior transfers"))]
  AmbiguousPriorTransfer {
    inscription: InscriptionId,
    count: usize,
  },
  #[snafu(display("{tick} balance of {address} would become negative"))]
  NegativeBalance { address: String, tick: String },
  #[snafu(display("token {tick} not found"))]
  MissingToken { tick: String },
  #[snafu(display(
    "no inscriptions reported for block {height} with chain head at {head}, provider may still be indexing"
  ))]
  InscriptionsPending { height: u32, head: u32 },
  #[snafu(display("Invalid chain `{chain}`"))]
  InvalidChain { chain: String },
  #[snafu(display("invalid configuration: {message}"))]
  InvalidConfiguration { message: String },
  #[snafu(display("{err}"))]
  Anyhow { err: anyhow::Error },
  #[snafu(display("environment variable `{variable}` not valid unicode: `{}`", value.to_string_lossy()))]
  EnvVarUnicode {
    backtrace: Backtrace,
    value: OsString,
    variable: String,
  },
  #[snafu(display("I/O error at `{}`", path.display()))]
  Io { source: io::Error, path: PathBuf },
}

impl From<Error> for SnafuError {
  fn from(err: Error) -> SnafuError {
    Self::Anyhow { err }
  }
}

/// Provides access to `snafu::ResultExt::{context, with_context}`, which are
/// otherwise shadowed by `anyhow::Context::{context, with_context}`.
pub(crate) trait ResultExt<T, E>: Sized {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + snafu::ErrorCompat;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E> {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + snafu::ErrorCompat,
  {
    use snafu::ResultExt;
    self.context(context)
  }
}
