use super::*;

/// Follows inscribed satoshis from the outputs a block's transactions spend
/// to the outputs they create.
pub(super) struct InscriptionUpdater<'index> {
  pub(super) height: u32,
  pub(super) index: &'index Index,
}

impl InscriptionUpdater<'_> {
  pub(super) fn index_transfers(&self, staged: &mut Staged) -> Result {
    for transaction in transactions::for_block(staged, self.height)? {
      self.index_transaction(staged, &transaction)?;
    }

    Ok(())
  }

  fn index_transaction(&self, staged: &mut Staged, transaction: &TransactionEntry) -> Result {
    let txid = transaction.txid;

    if transaction.inputs.is_empty() {
      return Err(SnafuError::MissingInputs { txid }.into());
    }

    if transaction.is_coinbase() {
      return Ok(());
    }

    for (input_index, input) in transaction.inputs.iter().enumerate() {
      let Some(spent) = outputs::get(staged, *input)? else {
        continue;
      };

      if spent.inscriptions.is_empty() {
        continue;
      }

      let ordinal = self.offset(staged, transaction, input_index)? + 1;

      let created = self.outputs(staged, txid)?;

      let destination = locate(created.iter().map(|output| output.value), ordinal);

      for inscription in &spent.inscriptions {
        let receiver = match destination {
          Some(position) => {
            let output = &created[position];
            outputs::add_inscription(staged, output.outpoint, *inscription)?;
            output.address.clone()
          }
          None => {
            log::debug!("inscription {inscription} spent as fee in {txid}");
            spent.address.clone()
          }
        };

        inscriptions::create_transfer(
          staged,
          &InscriptionTransferEntry {
            inscription: *inscription,
            tx_id: txid,
            input_index: u32::try_from(input_index)?,
            block_height: self.height,
            transaction_index: transaction.index,
            sender: spent.address.clone(),
            receiver,
            is_genesis: false,
          },
        )?;

        log::trace!("inscription {inscription} moved by {txid}");
      }
    }

    Ok(())
  }

  /// Total value of the inputs preceding `input_index`.
  fn offset(
    &self,
    staged: &Staged,
    transaction: &TransactionEntry,
    input_index: usize,
  ) -> Result<u128> {
    let mut offset = 0u128;

    for outpoint in &transaction.inputs[..input_index] {
      let value = match outputs::get(staged, *outpoint)? {
        Some(output) => output.value,
        None => {
          self
            .index
            .resolve_output(*outpoint)?
            .ok_or(SnafuError::UnresolvedOutput {
              outpoint: *outpoint,
              txid: transaction.txid,
            })?
            .value
        }
      };

      offset += u128::from(value);
    }

    Ok(offset)
  }

  /// Outputs created by `txid`, in creation order.
  fn outputs(&self, staged: &Staged, txid: Txid) -> Result<Vec<OutputEntry>> {
    let outpoints = outputs::outpoints(staged, txid)?;

    if outpoints.is_empty() {
      return Err(SnafuError::MissingOutputs { txid }.into());
    }

    let mut created = Vec::with_capacity(outpoints.len());

    for (position, outpoint) in outpoints.iter().enumerate() {
      if outpoints[..position].contains(outpoint) {
        return Err(
          SnafuError::DuplicateOutput {
            outpoint: *outpoint,
            txid,
          }
          .into(),
        );
      }

      created.push(outputs::get(staged, *outpoint)?.ok_or(SnafuError::MissingOutput {
        outpoint: *outpoint,
        txid,
      })?);
    }

    Ok(created)
  }
}

/// Position of the output holding the satoshi at 1-based `ordinal` within
/// the values of a transaction's outputs, or `None` if the outputs hold
/// fewer satoshis.
pub(super) fn locate(values: impl IntoIterator<Item = u64>, ordinal: u128) -> Option<usize> {
  let mut end = 0u128;

  for (position, value) in values.into_iter().enumerate() {
    end += u128::from(value);

    if ordinal <= end {
      return Some(position);
    }
  }

  None
}
