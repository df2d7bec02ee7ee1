use super::*;

fn key(id: InscriptionId) -> String {
  format!("inscription:{id}")
}

fn transfer_key(entry: &InscriptionTransferEntry) -> String {
  format!(
    "inscription-transfer:{}:{}:{}",
    entry.tx_id, entry.input_index, entry.inscription
  )
}

fn block_key(height: u32) -> String {
  format!("block-inscription-transfers:{height}")
}

/// Orders a block's transfers by transaction, then by input. Genesis
/// transfers sort after the inputs of their transaction.
fn score(entry: &InscriptionTransferEntry) -> u64 {
  (u64::from(entry.transaction_index) << 32) | u64::from(entry.input_index)
}

pub(crate) fn get(store: &dyn StoreRead, id: InscriptionId) -> Result<Option<InscriptionEntry>> {
  store
    .get(&key(id))?
    .map(|value| InscriptionEntry::load(&value))
    .transpose()
}

pub(crate) fn get_many(
  store: &dyn StoreRead,
  ids: &[InscriptionId],
) -> Result<Vec<Option<InscriptionEntry>>> {
  store
    .get_many(&ids.iter().copied().map(key).collect::<Vec<String>>())?
    .into_iter()
    .map(|value| value.map(|value| InscriptionEntry::load(&value)).transpose())
    .collect()
}

pub(crate) fn create(staged: &mut Staged, entry: &InscriptionEntry) -> Result {
  if entry.id != InscriptionId::genesis(entry.genesis_tx) {
    return Err(
      SnafuError::InscriptionIdMismatch {
        inscription: entry.id,
        genesis_tx: entry.genesis_tx,
      }
      .into(),
    );
  }

  staged.set(key(entry.id), entry.store()?);

  Ok(())
}

/// Records a transfer. Writing the same (transaction, input, inscription)
/// again replaces the earlier record.
pub(crate) fn create_transfer(staged: &mut Staged, entry: &InscriptionTransferEntry) -> Result {
  let key = transfer_key(entry);

  staged.zadd(block_key(entry.block_height), score(entry), key.clone());
  staged.set(key, entry.store()?);

  Ok(())
}

/// Transfers recorded for a block, oldest first.
pub(crate) fn transfers_for_block(
  store: &dyn StoreRead,
  height: u32,
) -> Result<Vec<InscriptionTransferEntry>> {
  let keys = store
    .zrange(&block_key(height))?
    .into_iter()
    .map(|(_, key)| key)
    .collect::<Vec<String>>();

  store
    .get_many(&keys)?
    .into_iter()
    .zip(&keys)
    .map(|(value, key)| {
      InscriptionTransferEntry::load(&value.ok_or_else(|| anyhow!("{key} not found"))?)
    })
    .collect()
}
