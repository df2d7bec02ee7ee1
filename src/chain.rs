use super::*;

#[derive(Default, ValueEnum, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
  #[default]
  #[value(alias("doge"))]
  Dogecoin,
  #[value(alias("doge-testnet"))]
  DogecoinTestnet,
  DogecoinRegtest,
}

impl Chain {
  /// Height of the first inscription, where indexing starts by default.
  pub(crate) fn first_inscription_height(self) -> u32 {
    match self {
      Self::Dogecoin => 4_600_000,
      Self::DogecoinTestnet => 4_250_000,
      Self::DogecoinRegtest => 0,
    }
  }

  /// Blocks above this height are expected to carry inscriptions. The
  /// explorer occasionally serves a fresh block before its inscriptions, so an
  /// empty block near the chain head is retried.
  pub(crate) fn inscription_wait_height(self) -> u32 {
    match self {
      Self::Dogecoin => 4_974_000,
      Self::DogecoinTestnet | Self::DogecoinRegtest => u32::MAX,
    }
  }

  pub(crate) fn join_with_data_dir(self, data_dir: impl AsRef<Path>) -> PathBuf {
    match self {
      Self::Dogecoin => data_dir.as_ref().to_owned(),
      Self::DogecoinTestnet => data_dir.as_ref().join("testnet3"),
      Self::DogecoinRegtest => data_dir.as_ref().join("regtest"),
    }
  }
}

impl Display for Chain {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::Dogecoin => "dogecoin",
        Self::DogecoinTestnet => "dogecoin-testnet",
        Self::DogecoinRegtest => "dogecoin-regtest",
      }
    )
  }
}

impl FromStr for Chain {
  type Err = SnafuError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "dogecoin" | "doge" | "mainnet" => Ok(Self::Dogecoin),
      "dogecoin-testnet" | "doge-testnet" | "testnet" => Ok(Self::DogecoinTestnet),
      "dogecoin-regtest" | "doge-regtest" | "regtest" => Ok(Self::DogecoinRegtest),
      _ => Err(SnafuError::InvalidChain {
        chain: s.to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_str() {
    assert_eq!("dogecoin".parse::<Chain>().unwrap(), Chain::Dogecoin);
    assert_eq!("doge".parse::<Chain>().unwrap(), Chain::Dogecoin);
    assert_eq!(
      "dogecoin-testnet".parse::<Chain>().unwrap(),
      Chain::DogecoinTestnet
    );
    assert_eq!(
      "dogecoin-regtest".parse::<Chain>().unwrap(),
      Chain::DogecoinRegtest
    );
    assert_eq!(
      "foo".parse::<Chain>().unwrap_err().to_string(),
      "Invalid chain `foo`"
    );
  }

  #[test]
  fn display_round_trips() {
    for chain in [
      Chain::Dogecoin,
      Chain::DogecoinTestnet,
      Chain::DogecoinRegtest,
    ] {
      assert_eq!(chain.to_string().parse::<Chain>().unwrap(), chain);
    }
  }

  #[test]
  fn inscription_wait_only_applies_to_mainnet() {
    assert_eq!(Chain::Dogecoin.inscription_wait_height(), 4_974_000);
    assert_eq!(Chain::DogecoinRegtest.inscription_wait_height(), u32::MAX);
  }

  #[test]
  fn join_with_data_dir() {
    assert_eq!(
      Chain::Dogecoin.join_with_data_dir("foo"),
      PathBuf::from("foo")
    );
    assert_eq!(
      Chain::DogecoinTestnet.join_with_data_dir("foo"),
      PathBuf::from("foo").join("testnet3")
    );
  }
}
