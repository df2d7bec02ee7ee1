use super::*;

fn key(height: u32) -> String {
  format!("block:{height}")
}

pub(crate) fn get(
  store: &dyn StoreRead,
  height: u32,
  txid: Txid,
) -> Result<Option<TransactionEntry>> {
  store
    .hget(&key(height), &txid.to_string())?
    .map(|value| TransactionEntry::load(&value))
    .transpose()
}

/// Transactions of a block in confirmation order.
pub(crate) fn for_block(store: &dyn StoreRead, height: u32) -> Result<Vec<TransactionEntry>> {
  let mut transactions = store
    .hgetall(&key(height))?
    .into_iter()
    .map(|(_, value)| TransactionEntry::load(&value))
    .collect::<Result<Vec<TransactionEntry>>>()?;

  transactions.sort_by_key(|transaction| transaction.index);

  Ok(transactions)
}

/// Writes `entry`, keeping the outputs flag of an earlier write.
pub(crate) fn upsert(staged: &mut Staged, mut entry: TransactionEntry) -> Result {
  if let Some(existing) = get(staged, entry.block_height, entry.txid)? {
    entry.outputs_fetched |= existing.outputs_fetched;
  }

  staged.hset(
    key(entry.block_height),
    entry.txid.to_string(),
    entry.store()?,
  );

  Ok(())
}

pub(crate) fn set_outputs_fetched(staged: &mut Staged, height: u32, txid: Txid) -> Result {
  let mut entry = get(staged, height, txid)?
    .ok_or_else(|| anyhow!("transaction {txid} not found in block {height}"))?;

  entry.outputs_fetched = true;

  staged.hset(key(height), txid.to_string(), entry.store()?);

  Ok(())
}

/// Drops every transaction recorded for `height`, returning how many there
/// were.
pub(crate) fn purge_block(staged: &mut Staged, height: u32) -> Result<usize> {
  let count = staged.hgetall(&key(height))?.len();

  if count > 0 {
    staged.del(key(height));
  }

  Ok(count)
}
