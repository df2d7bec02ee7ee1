use super::*;

fn key(name: &str) -> String {
  format!("status:{name}")
}

pub(crate) fn get(store: &dyn StoreRead, name: &str) -> Result<Option<u32>> {
  Ok(
    store
      .get(&key(name))?
      .map(|value| Status::load(&value))
      .transpose()?
      .map(|status| status.last_synced_block),
  )
}

pub(crate) fn set(staged: &mut Staged, name: &str, last_synced_block: u32) -> Result {
  staged.set(
    key(name),
    Status {
      name: name.into(),
      last_synced_block,
    }
    .store()?,
  );

  Ok(())
}
