use super::*;

const TICKS: &str = "drc20:ticks";

/// Hash of tick to number of addresses holding a balance of it.
pub(crate) const HOLDERS: &str = "drc20:holders";

fn key(tick: &str) -> String {
  format!("drc20:token:{tick}")
}

pub(crate) fn get(store: &dyn StoreRead, tick: &str) -> Result<Option<TokenEntry>> {
  store
    .get(&key(tick))?
    .map(|value| TokenEntry::load(&value))
    .transpose()
}

pub(crate) fn exists(store: &dyn StoreRead, tick: &str) -> Result<bool> {
  Ok(store.get(&key(tick))?.is_some())
}

/// Deployed tokens in deploy order.
pub(crate) fn all(store: &dyn StoreRead) -> Result<Vec<TokenEntry>> {
  let ticks = store.zrange(TICKS)?;

  store
    .get_many(
      &ticks
        .iter()
        .map(|(_, tick)| key(tick))
        .collect::<Vec<String>>(),
    )?
    .into_iter()
    .zip(ticks)
    .map(|(value, (_, tick))| {
      TokenEntry::load(&value.ok_or(SnafuError::MissingToken { tick })?)
    })
    .collect()
}

pub(crate) fn create(staged: &mut Staged, entry: &TokenEntry) -> Result {
  staged.zadd(
    TICKS,
    (u64::from(entry.block_height) << 32) | u64::from(entry.transaction_index),
    entry.tick.clone(),
  );
  staged.set(key(&entry.tick), entry.store()?);

  Ok(())
}

pub(crate) fn increase_supply(staged: &mut Staged, tick: &str, amount: Decimal) -> Result {
  let mut token = get(staged, tick)?.ok_or_else(|| SnafuError::MissingToken { tick: tick.into() })?;

  token.current_supply = token.current_supply.checked_add(amount)?;

  if token.current_supply > token.max {
    bail!("supply of {tick} would exceed max {}", token.max);
  }

  staged.set(key(tick), token.store()?);

  Ok(())
}

pub(crate) fn holders(store: &dyn StoreRead, tick: &str) -> Result<u64> {
  match store.hget(HOLDERS, tick)? {
    Some(value) => Ok(String::from_utf8(value)?.parse()?),
    None => Ok(0),
  }
}
