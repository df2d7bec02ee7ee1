use super::*;

fn key(address: &str) -> String {
  format!("drc20:balances:{}", address.to_lowercase())
}

fn tick_key(tick: &str) -> String {
  format!("drc20:tick-balances:{tick}")
}

pub(crate) fn get(store: &dyn StoreRead, address: &str, tick: &str) -> Result<Option<BalanceEntry>> {
  store
    .hget(&key(address), tick)?
    .map(|value| BalanceEntry::load(&value))
    .transpose()
}

/// Balances of an address, ordered by tick.
pub(crate) fn for_address(store: &dyn StoreRead, address: &str) -> Result<Vec<BalanceEntry>> {
  store
    .hgetall(&key(address))?
    .into_iter()
    .map(|(_, value)| BalanceEntry::load(&value))
    .collect()
}

/// Balances of a tick, ordered by lowercase address.
pub(crate) fn for_tick(store: &dyn StoreRead, tick: &str) -> Result<Vec<BalanceEntry>> {
  store
    .hgetall(&tick_key(tick))?
    .into_iter()
    .map(|(_, value)| BalanceEntry::load(&value))
    .collect()
}

fn put(staged: &mut Staged, entry: &BalanceEntry) -> Result {
  let value = entry.store()?;
  staged.hset(key(&entry.address), entry.tick.clone(), value.clone());
  staged.hset(
    tick_key(&entry.tick),
    entry.address.to_lowercase(),
    value,
  );
  Ok(())
}

/// Writes `entry`, removing it and releasing its holder slot once both of
/// its amounts are zero.
fn update(staged: &mut Staged, entry: &BalanceEntry) -> Result {
  if entry.is_empty() {
    staged.hdel(key(&entry.address), entry.tick.clone());
    staged.hdel(tick_key(&entry.tick), entry.address.to_lowercase());
    staged.hincrby(tokens::HOLDERS, entry.tick.clone(), -1)?;
    log::trace!("{} no longer holds {}", entry.address, entry.tick);
    Ok(())
  } else {
    put(staged, entry)
  }
}

pub(crate) fn credit_available(
  staged: &mut Staged,
  address: &str,
  tick: &str,
  amount: Decimal,
) -> Result {
  match get(staged, address, tick)? {
    Some(mut entry) => {
      entry.available = entry.available.checked_add(amount)?;
      put(staged, &entry)
    }
    None if amount.is_zero() => Ok(()),
    None => {
      put(
        staged,
        &BalanceEntry {
          tick: tick.into(),
          address: address.into(),
          available: amount,
          transferable: Decimal::ZERO,
        },
      )?;
      staged.hincrby(tokens::HOLDERS, tick, 1)
    }
  }
}

pub(crate) fn shift_to_transferable(
  staged: &mut Staged,
  address: &str,
  tick: &str,
  amount: Decimal,
) -> Result {
  let negative = || SnafuError::NegativeBalance {
    address: address.into(),
    tick: tick.into(),
  };

  let mut entry = get(staged, address, tick)?.ok_or_else(negative)?;

  entry.available = entry.available.checked_sub(amount).ok_or_else(negative)?;
  entry.transferable = entry.transferable.checked_add(amount)?;

  update(staged, &entry)
}

pub(crate) fn debit_transferable(
  staged: &mut Staged,
  address: &str,
  tick: &str,
  amount: Decimal,
) -> Result {
  let negative = || SnafuError::NegativeBalance {
    address: address.into(),
    tick: tick.into(),
  };

  let mut entry = get(staged, address, tick)?.ok_or_else(negative)?;

  entry.transferable = entry
    .transferable
    .checked_sub(amount)
    .ok_or_else(negative)?;

  update(staged, &entry)
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test::*, pretty_assertions::assert_eq};

  #[test]
  fn balance_lifecycle() {
    let store = MemoryStore::default();
    let mut staged = Staged::new(&store);

    credit_available(&mut staged, "DAlice", "xyz", decimal("100")).unwrap();
    assert_eq!(tokens::holders(&staged, "xyz").unwrap(), 1);

    shift_to_transferable(&mut staged, "DAlice", "xyz", decimal("40")).unwrap();
    let entry = get(&staged, "dalice", "xyz").unwrap().unwrap();
    assert_eq!(entry.address, "DAlice");
    assert_eq!(entry.available, decimal("60"));
    assert_eq!(entry.transferable, decimal("40"));
    assert_eq!(for_tick(&staged, "xyz").unwrap(), [entry]);

    shift_to_transferable(&mut staged, "DAlice", "xyz", decimal("60")).unwrap();
    debit_transferable(&mut staged, "DAlice", "xyz", decimal("100")).unwrap();

    assert_eq!(get(&staged, "DAlice", "xyz").unwrap(), None);
    assert!(for_tick(&staged, "xyz").unwrap().is_empty());
    assert!(for_address(&staged, "DAlice").unwrap().is_empty());
    assert_eq!(tokens::holders(&staged, "xyz").unwrap(), 0);
  }

  #[test]
  fn balances_cannot_become_negative() {
    let store = MemoryStore::default();
    let mut staged = Staged::new(&store);

    credit_available(&mut staged, "DAlice", "xyz", decimal("10")).unwrap();

    assert!(shift_to_transferable(&mut staged, "DAlice", "xyz", decimal("11")).is_err());
    assert!(debit_transferable(&mut staged, "DAlice", "xyz", decimal("1")).is_err());
    assert!(debit_transferable(&mut staged, "DBob", "xyz", decimal("1")).is_err());
  }

  #[test]
  fn zero_credit_creates_nothing() {
    let store = MemoryStore::default();
    let mut staged = Staged::new(&store);

    credit_available(&mut staged, "DAlice", "xyz", Decimal::ZERO).unwrap();

    assert_eq!(get(&staged, "DAlice", "xyz").unwrap(), None);
    assert_eq!(tokens::holders(&staged, "xyz").unwrap(), 0);
  }
}
