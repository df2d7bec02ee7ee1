use super::*;

/// Ledger meaning of an inscription transfer, determined by the inscription's
/// declared op and how many valid transfers of it came before.
#[derive(Debug, Copy, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum TransferKind {
  Deploy,
  Mint,
  Inscribe,
  Finalize,
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid dog-20 inscription transfer type: {0}")]
pub struct UnknownTransferKind(pub String);

impl TransferKind {
  pub fn classify(op: Op, prior: usize) -> Result<Self, UnknownTransferKind> {
    format!("{op}-transfer-{prior}").parse()
  }
}

impl Display for TransferKind {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.write_str(match self {
      Self::Deploy => "deploy-transfer-0",
      Self::Mint => "mint-transfer-0",
      Self::Inscribe => "transfer-transfer-0",
      Self::Finalize => "transfer-transfer-1",
    })
  }
}

impl FromStr for TransferKind {
  type Err = UnknownTransferKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "deploy-transfer-0" => Ok(Self::Deploy),
      "mint-transfer-0" => Ok(Self::Mint),
      "transfer-transfer-0" => Ok(Self::Inscribe),
      "transfer-transfer-1" => Ok(Self::Finalize),
      _ => Err(UnknownTransferKind(s.into())),
    }
  }
}
