use super::*;

fn key(inscription: InscriptionId) -> String {
  format!("drc20:transfers:{inscription}")
}

fn received_key(address: &str) -> String {
  format!("drc20:received:{}", address.to_lowercase())
}

fn sent_key(address: &str) -> String {
  format!("drc20:sent:{}", address.to_lowercase())
}

fn position(entry: &Drc20TransferEntry) -> u64 {
  (u64::from(entry.block_height) << 32) | u64::from(entry.transaction_index)
}

pub(crate) fn exists(store: &dyn StoreRead, inscription: InscriptionId, tx_id: Txid) -> Result<bool> {
  store.hexists(&key(inscription), &tx_id.to_string())
}

pub(crate) fn get(
  store: &dyn StoreRead,
  inscription: InscriptionId,
  tx_id: Txid,
) -> Result<Option<Drc20TransferEntry>> {
  store
    .hget(&key(inscription), &tx_id.to_string())?
    .map(|value| Drc20TransferEntry::load(&value))
    .transpose()
}

/// Ledger records of an inscription, oldest first.
pub(crate) fn all(store: &dyn StoreRead, inscription: InscriptionId) -> Result<Vec<Drc20TransferEntry>> {
  let mut entries = store
    .hgetall(&key(inscription))?
    .into_iter()
    .map(|(_, value)| Drc20TransferEntry::load(&value))
    .collect::<Result<Vec<Drc20TransferEntry>>>()?;

  entries.sort_by_key(position);

  Ok(entries)
}

/// Ledger records of an inscription that were not ignored, oldest first.
pub(crate) fn valid(store: &dyn StoreRead, inscription: InscriptionId) -> Result<Vec<Drc20TransferEntry>> {
  Ok(
    all(store, inscription)?
      .into_iter()
      .filter(|entry| !entry.is_ignored)
      .collect(),
  )
}

pub(crate) fn save(staged: &mut Staged, entry: &Drc20TransferEntry) -> Result {
  let member = format!("{}:{}", entry.inscription, entry.tx_id);

  if let Some(receiver) = &entry.receiver {
    staged.zadd(received_key(receiver), position(entry), member.clone());
  }

  if let Some(sender) = &entry.sender {
    staged.zadd(sent_key(sender), position(entry), member);
  }

  staged.hset(
    key(entry.inscription),
    entry.tx_id.to_string(),
    entry.store()?,
  );

  Ok(())
}

fn indexed(store: &dyn StoreRead, key: &str) -> Result<Vec<Drc20TransferEntry>> {
  store
    .zrange(key)?
    .into_iter()
    .map(|(_, member)| {
      let (inscription, tx_id) = member
        .split_once(':')
        .ok_or_else(|| anyhow!("malformed transfer reference `{member}`"))?;

      let (inscription, tx_id) = (inscription.parse()?, tx_id.parse()?);

      get(store, inscription, tx_id)?
        .ok_or_else(|| anyhow!("transfer of {inscription} in {tx_id} not found"))
    })
    .collect()
}

/// Ledger records received by an address, oldest first.
pub(crate) fn received(store: &dyn StoreRead, address: &str) -> Result<Vec<Drc20TransferEntry>> {
  indexed(store, &received_key(address))
}

/// Ledger records sent by an address, oldest first.
pub(crate) fn sent(store: &dyn StoreRead, address: &str) -> Result<Vec<Drc20TransferEntry>> {
  indexed(store, &sent_key(address))
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test::*, pretty_assertions::assert_eq};

  fn entry(block_height: u32, tx: u64, is_ignored: bool) -> Drc20TransferEntry {
    Drc20TransferEntry {
      inscription: inscription(1),
      tx_id: txid(tx),
      block_height,
      transaction_index: 0,
      sender: Some("DAlice".into()),
      receiver: Some("DBob".into()),
      tick: "xyz".into(),
      kind: None,
      is_ignored,
      reason_for_ignore: None,
      available_balance_change: Delta::NONE,
      transferable_balance_change: Delta::NONE,
    }
  }

  #[test]
  fn records_are_ordered_and_indexed() {
    let store = MemoryStore::default();
    let mut staged = Staged::new(&store);

    save(&mut staged, &entry(9, 1, false)).unwrap();
    save(&mut staged, &entry(3, 2, true)).unwrap();
    save(&mut staged, &entry(5, 3, false)).unwrap();

    assert!(exists(&staged, inscription(1), txid(2)).unwrap());
    assert!(!exists(&staged, inscription(1), txid(4)).unwrap());

    let heights = |entries: Vec<Drc20TransferEntry>| {
      entries
        .into_iter()
        .map(|entry| entry.block_height)
        .collect::<Vec<u32>>()
    };

    assert_eq!(heights(all(&staged, inscription(1)).unwrap()), [3, 5, 9]);
    assert_eq!(heights(valid(&staged, inscription(1)).unwrap()), [5, 9]);
    assert_eq!(heights(received(&staged, "dbob").unwrap()), [3, 5, 9]);
    assert_eq!(heights(sent(&staged, "DALICE").unwrap()), [3, 5, 9]);
    assert!(sent(&staged, "DBob").unwrap().is_empty());
  }
}
