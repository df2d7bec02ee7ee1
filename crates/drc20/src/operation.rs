use super::*;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap());

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
  #[display("deploy")]
  Deploy,
  #[display("mint")]
  Mint,
  #[display("transfer")]
  Transfer,
}

/// Token operation declared by an inscription's content.
///
/// Numeric fields keep their original literal so that length limits can be
/// checked against what was inscribed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
  pub p: String,
  pub op: Op,
  pub tick: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amt: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lim: Option<String>,
}

impl Operation {
  /// Parses inscription content, returning `None` unless it is a well formed
  /// operation for one of `protocols`.
  pub fn from_content(content: &str, protocols: &[String]) -> Option<Self> {
    let Value::Object(object) = serde_json::from_str::<Value>(content).ok()? else {
      return None;
    };

    let p = object.get("p")?.as_str()?;

    if !protocols.iter().any(|protocol| protocol == p) {
      return None;
    }

    let op = match object.get("op")?.as_str()? {
      "deploy" => Op::Deploy,
      "mint" => Op::Mint,
      "transfer" => Op::Transfer,
      _ => return None,
    };

    let tick = object.get("tick")?.as_str()?;

    let field = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_owned);

    let (amt, max, lim) = (field("amt"), field("max"), field("lim"));

    let numeric = |value: &Option<String>| {
      value
        .as_deref()
        .is_some_and(|value| NUMERIC.is_match(value))
    };

    let valid = match op {
      Op::Deploy => numeric(&max) && numeric(&lim),
      Op::Mint | Op::Transfer => numeric(&amt),
    };

    valid.then(|| Self {
      p: p.into(),
      op,
      tick: tick.into(),
      amt,
      max,
      lim,
    })
  }

  /// Ticks are case-insensitive and stored lowercase.
  pub fn tick(&self) -> String {
    self.tick.to_lowercase()
  }
}
