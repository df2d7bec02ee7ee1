use super::*;

enum Outcome {
  Applied { available: Delta, transferable: Delta },
  Ignored(String),
}

impl Outcome {
  fn ignored(reason: impl Into<String>) -> Self {
    Self::Ignored(reason.into())
  }
}

/// Interprets a block's inscription transfers as token operations.
///
/// The kind of a transfer depends on how many valid transfers of its
/// inscription were recorded before it, so transfers are applied strictly in
/// block order and a single writer is assumed.
pub(super) struct Drc20Updater<'index> {
  pub(super) height: u32,
  pub(super) protocols: &'index [String],
}

impl Drc20Updater<'_> {
  pub(super) fn index_transfers(&self, staged: &mut Staged) -> Result {
    let transfers = inscriptions::transfers_for_block(staged, self.height)?;

    let contents = inscriptions::get_many(
      staged,
      &transfers
        .iter()
        .map(|transfer| transfer.inscription)
        .collect::<Vec<InscriptionId>>(),
    )?;

    for (transfer, inscription) in transfers.iter().zip(contents) {
      if transfers::exists(staged, transfer.inscription, transfer.tx_id)? {
        log::trace!(
          "transfer of {} in {} already indexed",
          transfer.inscription,
          transfer.tx_id
        );
        continue;
      }

      let Some(content) = inscription.and_then(|inscription| inscription.content) else {
        continue;
      };

      let Some(operation) = Operation::from_content(&content, self.protocols) else {
        continue;
      };

      self.index_transfer(staged, transfer, &operation)?;
    }

    let purged = transactions::purge_block(staged, self.height)?;

    log::debug!("purged {purged} transactions of block {}", self.height);

    Ok(())
  }

  fn index_transfer(
    &self,
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
  ) -> Result {
    for (name, literal) in [
      ("max", &operation.max),
      ("lim", &operation.lim),
      ("amt", &operation.amt),
    ] {
      if let Some(literal) = literal
        && literal.len() > MAX_LITERAL_LENGTH
      {
        log::warn!(
          "{name} of inscription {} is longer than {MAX_LITERAL_LENGTH} characters: {literal}",
          transfer.inscription
        );
      }
    }

    let prior = transfers::valid(staged, transfer.inscription)?;

    let tick = operation.tick();

    let (kind, outcome) = match TransferKind::classify(operation.op, prior.len()) {
      Ok(kind) => {
        let outcome = match kind {
          TransferKind::Deploy => Self::deploy(staged, transfer, operation, &tick)?,
          TransferKind::Mint => Self::mint(staged, transfer, operation, &tick)?,
          TransferKind::Inscribe => Self::inscribe(staged, transfer, operation, &tick)?,
          TransferKind::Finalize => Self::finalize(staged, transfer, operation, &tick, &prior)?,
        };
        (Some(kind), outcome)
      }
      Err(err) => (None, Outcome::Ignored(err.to_string())),
    };

    Self::record(staged, transfer, tick, kind, outcome)
  }

  fn deploy(
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
    tick: &str,
  ) -> Result<Outcome> {
    let (Some(max), Some(lim)) = (&operation.max, &operation.lim) else {
      return Ok(Outcome::ignored("max and lim must be defined"));
    };

    if max.len() > MAX_LITERAL_LENGTH {
      return Ok(Outcome::ignored("max cannot be more than 20 characters"));
    }

    if lim.len() > MAX_LITERAL_LENGTH {
      return Ok(Outcome::ignored("lim cannot be more than 20 characters"));
    }

    let max = match max.parse::<Decimal>() {
      Ok(max) if max.is_zero() => return Ok(Outcome::ignored("max cannot be negative or null")),
      Ok(max) => max,
      Err(err) => return Ok(Outcome::Ignored(format!("invalid max: {err}"))),
    };

    let lim = match lim.parse::<Decimal>() {
      Ok(lim) if lim.is_zero() => return Ok(Outcome::ignored("lim cannot be negative or null")),
      Ok(lim) => lim,
      Err(err) => return Ok(Outcome::Ignored(format!("invalid lim: {err}"))),
    };

    if tokens::exists(staged, tick)? {
      return Ok(Outcome::ignored("tick already deployed"));
    }

    tokens::create(
      staged,
      &TokenEntry {
        tick: tick.into(),
        max,
        lim,
        current_supply: Decimal::ZERO,
        p: operation.p.clone(),
        tx_id: transfer.tx_id,
        inscription: transfer.inscription,
        block_height: transfer.block_height,
        transaction_index: transfer.transaction_index,
      },
    )?;

    log::info!("deployed {tick} with max {max} and lim {lim}");

    Ok(Outcome::Applied {
      available: Delta::NONE,
      transferable: Delta::NONE,
    })
  }

  fn mint(
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
    tick: &str,
  ) -> Result<Outcome> {
    let amount = match Self::amount(transfer, operation)? {
      Ok(amount) => amount,
      Err(outcome) => return Ok(outcome),
    };

    let Some(token) = tokens::get(staged, tick)? else {
      return Ok(Outcome::Ignored(format!("tick not deployed {tick}")));
    };

    let Some(receiver) = &transfer.receiver else {
      return Ok(Outcome::ignored("no receiver address"));
    };

    if amount > token.lim {
      return Ok(Outcome::ignored("above limit"));
    }

    if token.current_supply >= token.max {
      return Ok(Outcome::ignored("above max supply"));
    }

    let minted = amount.min(token.remaining());

    balances::credit_available(staged, receiver, tick, minted)?;
    tokens::increase_supply(staged, tick, minted)?;

    Ok(Outcome::Applied {
      available: Delta::Credit(minted),
      transferable: Delta::NONE,
    })
  }

  fn inscribe(
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
    tick: &str,
  ) -> Result<Outcome> {
    let amount = match Self::amount(transfer, operation)? {
      Ok(amount) => amount,
      Err(outcome) => return Ok(outcome),
    };

    if !tokens::exists(staged, tick)? {
      return Ok(Outcome::Ignored(format!("tick not deployed {tick}")));
    }

    let Some(receiver) = &transfer.receiver else {
      return Ok(Outcome::ignored("no receiver address"));
    };

    let available = balances::get(staged, receiver, tick)?
      .map(|balance| balance.available)
      .unwrap_or_default();

    if available < amount {
      return Ok(Outcome::ignored("not enough available balance"));
    }

    balances::shift_to_transferable(staged, receiver, tick, amount)?;

    Ok(Outcome::Applied {
      available: Delta::Debit(amount),
      transferable: Delta::Credit(amount),
    })
  }

  fn finalize(
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
    tick: &str,
    prior: &[Drc20TransferEntry],
  ) -> Result<Outcome> {
    let amount = match Self::amount(transfer, operation)? {
      Ok(amount) => amount,
      Err(outcome) => return Ok(outcome),
    };

    if !tokens::exists(staged, tick)? {
      return Ok(Outcome::Ignored(format!("tick not deployed {tick}")));
    }

    let sender = transfer.sender.as_deref().ok_or(SnafuError::MissingSender {
      inscription: transfer.inscription,
      tx_id: transfer.tx_id,
    })?;

    let transferable = balances::get(staged, sender, tick)?
      .map(|balance| balance.transferable)
      .unwrap_or_default();

    if transferable < amount {
      return Ok(Outcome::ignored("not enough transferable balance"));
    }

    let holder = match prior {
      [] => return Ok(Outcome::ignored("no valid prior inscription transfer")),
      [inscribed] => inscribed.receiver.as_deref().with_context(|| {
        format!(
          "valid transfer of {} in {} has no receiver",
          inscribed.inscription, inscribed.tx_id
        )
      })?,
      _ => {
        return Err(
          SnafuError::AmbiguousPriorTransfer {
            inscription: transfer.inscription,
            count: prior.len(),
          }
          .into(),
        );
      }
    };

    let Some(receiver) = &transfer.receiver else {
      return Ok(Outcome::ignored("no receiver address"));
    };

    balances::debit_transferable(staged, holder, tick, amount)?;
    balances::credit_available(staged, receiver, tick, amount)?;

    Ok(Outcome::Applied {
      available: Delta::NONE,
      transferable: Delta::Credit(amount),
    })
  }

  /// The `amt` of a mint or transfer. A missing amount is malformed data,
  /// while an amount that is not a positive decimal is ignored.
  fn amount(
    transfer: &InscriptionTransferEntry,
    operation: &Operation,
  ) -> Result<Result<Decimal, Outcome>> {
    let amt = operation.amt.as_deref().ok_or(SnafuError::MissingAmount {
      inscription: transfer.inscription,
      tx_id: transfer.tx_id,
    })?;

    Ok(match amt.parse::<Decimal>() {
      Ok(amount) if amount.is_zero() => Err(Outcome::ignored("amt cannot be negative or null")),
      Ok(amount) => Ok(amount),
      Err(err) => Err(Outcome::Ignored(format!("invalid amt: {err}"))),
    })
  }

  fn record(
    staged: &mut Staged,
    transfer: &InscriptionTransferEntry,
    tick: String,
    kind: Option<TransferKind>,
    outcome: Outcome,
  ) -> Result {
    let (available, transferable, reason) = match outcome {
      Outcome::Applied {
        available,
        transferable,
      } => (available, transferable, None),
      Outcome::Ignored(reason) => {
        log::debug!(
          "ignoring transfer of {} in {}: {reason}",
          transfer.inscription,
          transfer.tx_id
        );
        (Delta::NONE, Delta::NONE, Some(reason))
      }
    };

    transfers::save(
      staged,
      &Drc20TransferEntry {
        inscription: transfer.inscription,
        tx_id: transfer.tx_id,
        block_height: transfer.block_height,
        transaction_index: transfer.transaction_index,
        sender: transfer.sender.clone(),
        receiver: transfer.receiver.clone(),
        tick,
        kind,
        is_ignored: reason.is_some(),
        reason_for_ignore: reason,
        available_balance_change: available,
        transferable_balance_change: transferable,
      },
    )
  }
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test::*, pretty_assertions::assert_eq};

  struct Ledger {
    store: MemoryStore,
    next: u64,
  }

  impl Ledger {
    fn new() -> Self {
      Self {
        store: MemoryStore::default(),
        next: 1,
      }
    }

    /// Moves inscription `n` holding `content` to `receiver` in a new
    /// transaction and indexes it.
    fn transfer(
      &mut self,
      n: u64,
      content: &str,
      sender: Option<&str>,
      receiver: &str,
    ) -> Drc20TransferEntry {
      let mut staged = Staged::new(&self.store);

      if inscriptions::get(&staged, inscription(n)).unwrap().is_none() {
        inscriptions::create(
          &mut staged,
          &InscriptionEntry {
            id: inscription(n),
            genesis_tx: txid(n),
            content: Some(content.into()),
          },
        )
        .unwrap();
      }

      let transfer = InscriptionTransferEntry {
        inscription: inscription(n),
        tx_id: txid(1000 + self.next),
        input_index: 0,
        block_height: 10,
        transaction_index: u32::try_from(self.next).unwrap(),
        sender: sender.map(str::to_owned),
        receiver: Some(receiver.into()),
        is_genesis: sender.is_none(),
      };
      self.next += 1;

      inscriptions::create_transfer(&mut staged, &transfer).unwrap();

      Drc20Updater {
        height: 10,
        protocols: &["drc-20".into()],
      }
      .index_transfers(&mut staged)
      .unwrap();

      staged.commit().unwrap();

      transfers::get(&self.store, transfer.inscription, transfer.tx_id)
        .unwrap()
        .unwrap()
    }

    fn deploy(&mut self, n: u64, max: &str, lim: &str) -> Drc20TransferEntry {
      self.transfer(
        n,
        &format!(r#"{{"p":"drc-20","op":"deploy","tick":"XYZ","max":"{max}","lim":"{lim}"}}"#),
        None,
        "DDeployer",
      )
    }

    fn mint(&mut self, n: u64, amt: &str, receiver: &str) -> Drc20TransferEntry {
      self.transfer(
        n,
        &format!(r#"{{"p":"drc-20","op":"mint","tick":"xyz","amt":"{amt}"}}"#),
        None,
        receiver,
      )
    }

    fn balance(&self, address: &str) -> Option<(Decimal, Decimal)> {
      balances::get(&self.store, address, "xyz")
        .unwrap()
        .map(|balance| (balance.available, balance.transferable))
    }

    fn supply(&self) -> Decimal {
      tokens::get(&self.store, "xyz")
        .unwrap()
        .unwrap()
        .current_supply
    }
  }

  const TRANSFER_40: &str = r#"{"p":"drc-20","op":"transfer","tick":"xyz","amt":"40"}"#;

  #[test]
  fn deploy_creates_token() {
    let mut ledger = Ledger::new();

    let record = ledger.deploy(1, "1000", "100");

    assert_eq!(record.kind, Some(TransferKind::Deploy));
    assert!(!record.is_ignored);

    let token = tokens::get(&ledger.store, "xyz").unwrap().unwrap();
    assert_eq!(token.max, decimal("1000"));
    assert_eq!(token.lim, decimal("100"));
    assert_eq!(token.current_supply, Decimal::ZERO);
  }

  #[test]
  fn invalid_deploys_are_ignored() {
    let mut ledger = Ledger::new();

    assert_eq!(
      ledger.deploy(1, "0", "100").reason_for_ignore.as_deref(),
      Some("max cannot be negative or null")
    );
    assert_eq!(
      ledger
        .deploy(2, "123456789012345678901", "100")
        .reason_for_ignore
        .as_deref(),
      Some("max cannot be more than 20 characters")
    );

    ledger.deploy(3, "1000", "100");
    assert_eq!(
      ledger.deploy(4, "5", "5").reason_for_ignore.as_deref(),
      Some("tick already deployed")
    );
  }

  #[test]
  fn mint_is_capped_at_max_supply() {
    let mut ledger = Ledger::new();
    ledger.deploy(1, "1000", "100");

    for n in 2..=10 {
      ledger.mint(n, "100", "DAlice");
    }
    ledger.mint(11, "50", "DAlice");
    assert_eq!(ledger.supply(), decimal("950"));

    let record = ledger.mint(12, "100", "DBob");
    assert_eq!(record.available_balance_change, Delta::Credit(decimal("50")));
    assert_eq!(ledger.supply(), decimal("1000"));
    assert_eq!(ledger.balance("DBob"), Some((decimal("50"), Decimal::ZERO)));
    assert_eq!(tokens::holders(&ledger.store, "xyz").unwrap(), 2);

    assert_eq!(
      ledger.mint(13, "1", "DBob").reason_for_ignore.as_deref(),
      Some("above max supply")
    );
  }

  #[test]
  fn invalid_mints_are_ignored() {
    let mut ledger = Ledger::new();

    assert_eq!(
      ledger.mint(1, "1", "DAlice").reason_for_ignore.as_deref(),
      Some("tick not deployed xyz")
    );

    ledger.deploy(2, "1000", "100");

    assert_eq!(
      ledger.mint(3, "101", "DAlice").reason_for_ignore.as_deref(),
      Some("above limit")
    );
    assert_eq!(
      ledger.mint(4, "0", "DAlice").reason_for_ignore.as_deref(),
      Some("amt cannot be negative or null")
    );
    assert_eq!(ledger.balance("DAlice"), None);
  }

  #[test]
  fn inscribe_then_finalize() {
    let mut ledger = Ledger::new();
    ledger.deploy(1, "1000", "100");
    ledger.mint(2, "100", "DAlice");

    let inscribed = ledger.transfer(3, TRANSFER_40, None, "DAlice");
    assert_eq!(inscribed.kind, Some(TransferKind::Inscribe));
    assert_eq!(inscribed.available_balance_change.to_string(), "-40");
    assert_eq!(inscribed.transferable_balance_change.to_string(), "40");
    assert_eq!(
      ledger.balance("DAlice"),
      Some((decimal("60"), decimal("40")))
    );

    let finalized = ledger.transfer(3, TRANSFER_40, Some("DAlice"), "DBob");
    assert_eq!(finalized.kind, Some(TransferKind::Finalize));
    assert_eq!(finalized.available_balance_change, Delta::NONE);
    assert_eq!(
      finalized.transferable_balance_change,
      Delta::Credit(decimal("40"))
    );
    assert_eq!(ledger.balance("DAlice"), Some((decimal("60"), Decimal::ZERO)));
    assert_eq!(ledger.balance("DBob"), Some((decimal("40"), Decimal::ZERO)));

    let third = ledger.transfer(3, TRANSFER_40, Some("DBob"), "DCarol");
    assert_eq!(third.kind, None);
    assert_eq!(
      third.reason_for_ignore.as_deref(),
      Some("invalid dog-20 inscription transfer type: transfer-transfer-2")
    );
    assert_eq!(ledger.balance("DCarol"), None);
  }

  #[test]
  fn finalize_deletes_empty_balance() {
    let mut ledger = Ledger::new();
    ledger.deploy(1, "1000", "100");
    ledger.mint(2, "40", "DAlice");

    ledger.transfer(3, TRANSFER_40, None, "DAlice");
    ledger.transfer(3, TRANSFER_40, Some("DAlice"), "DBob");

    assert_eq!(ledger.balance("DAlice"), None);
    assert_eq!(tokens::holders(&ledger.store, "xyz").unwrap(), 1);
  }

  #[test]
  fn inscribe_requires_available_balance() {
    let mut ledger = Ledger::new();
    ledger.deploy(1, "1000", "100");
    ledger.mint(2, "10", "DAlice");

    let record = ledger.transfer(3, TRANSFER_40, None, "DAlice");

    assert!(record.is_ignored);
    assert_eq!(
      record.reason_for_ignore.as_deref(),
      Some("not enough available balance")
    );
    assert_eq!(ledger.balance("DAlice"), Some((decimal("10"), Decimal::ZERO)));
  }

  #[test]
  fn second_mint_transfer_is_ignored() {
    let mut ledger = Ledger::new();
    ledger.deploy(1, "1000", "100");
    ledger.mint(2, "10", "DAlice");

    let moved = ledger.transfer(
      2,
      r#"{"p":"drc-20","op":"mint","tick":"xyz","amt":"10"}"#,
      Some("DAlice"),
      "DBob",
    );

    assert_eq!(
      moved.reason_for_ignore.as_deref(),
      Some("invalid dog-20 inscription transfer type: mint-transfer-1")
    );
    assert_eq!(ledger.supply(), decimal("10"));
  }

  #[test]
  fn non_token_content_is_skipped() {
    let store = MemoryStore::default();
    let mut staged = Staged::new(&store);

    inscriptions::create(
      &mut staged,
      &InscriptionEntry {
        id: inscription(1),
        genesis_tx: txid(1),
        content: Some("error".into()),
      },
    )
    .unwrap();
    inscriptions::create_transfer(
      &mut staged,
      &InscriptionTransferEntry {
        inscription: inscription(1),
        tx_id: txid(1),
        input_index: InscriptionTransferEntry::GENESIS_INPUT,
        block_height: 10,
        transaction_index: 0,
        sender: None,
        receiver: Some("DAlice".into()),
        is_genesis: true,
      },
    )
    .unwrap();

    Drc20Updater {
      height: 10,
      protocols: &["drc-20".into()],
    }
    .index_transfers(&mut staged)
    .unwrap();

    assert!(transfers::all(&staged, inscription(1)).unwrap().is_empty());
  }
}
