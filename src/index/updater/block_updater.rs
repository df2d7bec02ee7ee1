use super::*;

/// Materializes a fetched block: its transactions, their outputs and the
/// inscriptions they create.
pub(super) struct BlockUpdater<'index> {
  pub(super) height: u32,
  pub(super) index: &'index Index,
}

impl BlockUpdater<'_> {
  pub(super) fn index_block(&self, staged: &mut Staged) -> Result {
    let block = self.index.fetch_block(self.height)?;

    self.check_inscriptions(&block)?;

    for (position, transaction) in block.transactions.iter().enumerate() {
      transactions::upsert(
        staged,
        TransactionEntry {
          txid: transaction.txid,
          block_height: self.height,
          index: u32::try_from(position)?,
          timestamp: block.timestamp,
          inputs: transaction.inputs.clone(),
          outputs_fetched: false,
        },
      )?;
    }

    for (position, transaction) in block.transactions.iter().enumerate() {
      self.index_transaction(staged, u32::try_from(position)?, transaction)?;
    }

    Ok(())
  }

  /// The provider may serve a block near the chain head before it has
  /// indexed the block's inscriptions.
  fn check_inscriptions(&self, block: &BlockData) -> Result {
    if self.height <= self.index.settings().inscription_wait_height() || block.has_inscriptions() {
      return Ok(());
    }

    let head = self.index.chain_head()?;

    if head.saturating_sub(self.height) < 2 {
      log::info!(
        "no inscriptions in block {} with chain head at {head}, waiting for provider",
        self.height
      );

      pause(self.index.settings().inscription_wait());

      return Err(
        SnafuError::InscriptionsPending {
          height: self.height,
          head,
        }
        .into(),
      );
    }

    Ok(())
  }

  fn index_transaction(
    &self,
    staged: &mut Staged,
    transaction_index: u32,
    transaction: &TransactionData,
  ) -> Result {
    let txid = transaction.txid;

    if transactions::get(staged, self.height, txid)?.is_some_and(|entry| entry.outputs_fetched) {
      log::trace!("outputs of {txid} already written");
      return Ok(());
    }

    for output in &transaction.outputs {
      if output.outpoint.txid != txid {
        return Err(
          SnafuError::OutputTransactionMismatch {
            outpoint: output.outpoint,
            txid,
          }
          .into(),
        );
      }

      outputs::write(
        staged,
        OutputEntry {
          outpoint: output.outpoint,
          value: output.value,
          address: output.address.clone(),
          block_height: self.height,
          transaction_index,
          inscriptions: Vec::new(),
        },
      )?;
    }

    if let Some(genesis) = &transaction.genesis_inscription
      && let Some(content) = &genesis.content
    {
      inscriptions::create(
        staged,
        &InscriptionEntry {
          id: genesis.id,
          genesis_tx: txid,
          content: Some(content.clone()),
        },
      )?;

      let first = transaction
        .outputs
        .first()
        .ok_or(SnafuError::MissingOutputs { txid })?;

      outputs::add_inscription(staged, first.outpoint, genesis.id)?;

      inscriptions::create_transfer(
        staged,
        &InscriptionTransferEntry {
          inscription: genesis.id,
          tx_id: txid,
          input_index: InscriptionTransferEntry::GENESIS_INPUT,
          block_height: self.height,
          transaction_index,
          sender: None,
          receiver: first.address.clone(),
          is_genesis: true,
        },
      )?;

      log::debug!("inscription {} created in block {}", genesis.id, self.height);
    }

    transactions::set_outputs_fetched(staged, self.height, txid)
  }
}
