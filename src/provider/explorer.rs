use {
  super::*,
  reqwest::{StatusCode, blocking::Client, header},
};

#[derive(Debug, Deserialize)]
struct JsonBlock {
  timestamp: i64,
  transactions: Vec<JsonTransaction>,
}

#[derive(Debug, Deserialize)]
struct JsonTransaction {
  txid: Txid,
  #[serde(default)]
  inputs: Vec<OutPoint>,
  #[serde(default)]
  outputs: Vec<OutPoint>,
  #[serde(default)]
  output_values: Vec<u64>,
  #[serde(default)]
  output_addresses: Vec<Option<String>>,
  inscription_id: Option<InscriptionId>,
  inscription_content_type: Option<String>,
  inscription_content: Option<String>,
}

impl JsonTransaction {
  fn into_transaction_data(self) -> Result<TransactionData> {
    let txid = self.txid;

    if self.outputs.len() != self.output_values.len() {
      return Err(
        SnafuError::OutputValueCount {
          txid,
          outputs: self.outputs.len(),
          values: self.output_values.len(),
        }
        .into(),
      );
    }

    let mut outputs = Vec::with_capacity(self.outputs.len());

    for (position, (outpoint, value)) in self.outputs.into_iter().zip(self.output_values).enumerate()
    {
      if outpoint.txid != txid {
        return Err(SnafuError::OutputTransactionMismatch { outpoint, txid }.into());
      }

      if usize::try_from(outpoint.vout).ok() != Some(position) {
        return Err(SnafuError::OutputIndexMismatch { outpoint, position }.into());
      }

      outputs.push(OutputData {
        outpoint,
        value,
        address: self.output_addresses.get(position).cloned().flatten(),
      });
    }

    let genesis_inscription = self.inscription_id.map(|id| GenesisInscription {
      id,
      content: Self::content(
        self.inscription_content_type.as_deref(),
        self.inscription_content,
      ),
    });

    Ok(TransactionData {
      txid,
      inputs: self.inputs,
      outputs,
      genesis_inscription,
    })
  }

  /// Textual content is kept when it is valid JSON. Text that fails to parse
  /// is stored as `"error"` so the inscription is never read as an operation.
  fn content(content_type: Option<&str>, content: Option<String>) -> Option<String> {
    let content_type = content_type?.trim();

    if !(content_type.starts_with("text/plain") || content_type.starts_with("application/json")) {
      return None;
    }

    match content {
      Some(content) if serde_json::from_str::<serde_json::Value>(&content).is_ok() => {
        Some(content)
      }
      _ => Some("error".into()),
    }
  }
}

/// Reads chain data from an ordinals explorer's JSON API.
pub struct Explorer {
  client: Client,
  url: String,
}

impl Explorer {
  pub fn new(url: &str) -> Result<Self> {
    Ok(Self {
      client: Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("failed to build explorer client")?,
      url: url.trim_end_matches('/').into(),
    })
  }

  fn get(&self, path: &str) -> Result<reqwest::blocking::Response> {
    let url = format!("{}{path}", self.url);

    log::trace!("GET {url}");

    self
      .client
      .get(&url)
      .header(header::ACCEPT, "application/json")
      .send()
      .with_context(|| format!("failed to request `{url}`"))
  }
}

impl DataProvider for Explorer {
  fn chain_head(&self) -> Result<u32> {
    let text = self.get("/blockheight")?.error_for_status()?.text()?;

    text
      .trim()
      .parse()
      .with_context(|| format!("invalid block height `{}`", text.trim()))
  }

  fn block(&self, height: u32) -> Result<BlockData> {
    let block = self
      .get(&format!("/block/{height}"))?
      .error_for_status()?
      .json::<JsonBlock>()
      .with_context(|| format!("failed to decode block {height}"))?;

    let timestamp = Utc
      .timestamp_opt(block.timestamp, 0)
      .single()
      .with_context(|| format!("block {height} has invalid timestamp {}", block.timestamp))?;

    log::debug!(
      "fetched block {height} with {} transactions",
      block.transactions.len()
    );

    Ok(BlockData {
      height,
      timestamp,
      transactions: block
        .transactions
        .into_iter()
        .map(JsonTransaction::into_transaction_data)
        .collect::<Result<Vec<TransactionData>>>()?,
    })
  }

  fn output(&self, outpoint: OutPoint) -> Result<Option<OutputValue>> {
    let response = self.get(&format!("/output/{outpoint}"))?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }

    Ok(Some(
      response
        .error_for_status()?
        .json()
        .with_context(|| format!("failed to decode output {outpoint}"))?,
    ))
  }
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test::*, pretty_assertions::assert_eq};

  fn transaction(json: serde_json::Value) -> Result<TransactionData> {
    serde_json::from_value::<JsonTransaction>(json)
      .unwrap()
      .into_transaction_data()
  }

  #[test]
  fn decodes_transaction() {
    let txid = txid(1);

    assert_eq!(
      transaction(serde_json::json!({
        "txid": txid,
        "inputs": [outpoint(2, 1)],
        "outputs": [outpoint(1, 0), outpoint(1, 1)],
        "output_values": [100, 50],
        "output_addresses": ["DAlice"],
        "inscription_id": inscription(1),
        "inscription_content_type": "text/plain;charset=utf-8",
        "inscription_content": "{\"p\":\"drc-20\"}",
      }))
      .unwrap(),
      TransactionData {
        txid,
        inputs: vec![outpoint(2, 1)],
        outputs: vec![
          OutputData {
            outpoint: outpoint(1, 0),
            value: 100,
            address: Some("DAlice".into()),
          },
          OutputData {
            outpoint: outpoint(1, 1),
            value: 50,
            address: None,
          },
        ],
        genesis_inscription: Some(GenesisInscription {
          id: inscription(1),
          content: Some("{\"p\":\"drc-20\"}".into()),
        }),
      }
    );
  }

  #[test]
  fn output_checks() {
    assert!(matches!(
      transaction(serde_json::json!({
        "txid": txid(1),
        "outputs": [outpoint(1, 0)],
        "output_values": [],
      }))
      .unwrap_err()
      .downcast::<SnafuError>(),
      Ok(SnafuError::OutputValueCount { .. })
    ));

    assert!(matches!(
      transaction(serde_json::json!({
        "txid": txid(1),
        "outputs": [outpoint(1, 1)],
        "output_values": [1],
      }))
      .unwrap_err()
      .downcast::<SnafuError>(),
      Ok(SnafuError::OutputIndexMismatch { position: 0, .. })
    ));

    assert!(matches!(
      transaction(serde_json::json!({
        "txid": txid(1),
        "outputs": [outpoint(2, 0)],
        "output_values": [1],
      }))
      .unwrap_err()
      .downcast::<SnafuError>(),
      Ok(SnafuError::OutputTransactionMismatch { .. })
    ));
  }

  #[test]
  fn content() {
    assert_eq!(JsonTransaction::content(None, Some("{}".into())), None);
    assert_eq!(
      JsonTransaction::content(Some("image/png"), Some("{}".into())),
      None
    );
    assert_eq!(
      JsonTransaction::content(Some("application/json"), Some("{}".into())),
      Some("{}".into())
    );
    assert_eq!(
      JsonTransaction::content(Some("text/plain"), Some("hello".into())),
      Some("error".into())
    );
    assert_eq!(
      JsonTransaction::content(Some("text/plain"), None),
      Some("error".into())
    );
  }
}
