use super::*;

#[derive(Debug, Default, Clone)]
struct Tables {
  scalars: BTreeMap<String, Vec<u8>>,
  hashes: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
  sorted_sets: BTreeMap<String, BTreeMap<String, u64>>,
  lists: BTreeMap<String, Vec<Vec<u8>>>,
}

impl Tables {
  fn apply(&mut self, mutation: Mutation) -> Result {
    match mutation {
      Mutation::Set { key, value } => {
        self.scalars.insert(key, value);
      }
      Mutation::Del { key } => self.clear(&key),
      Mutation::HSet { key, field, value } => {
        self.hashes.entry(key).or_default().insert(field, value);
      }
      Mutation::HDel { key, field } => {
        if let Some(hash) = self.hashes.get_mut(&key) {
          hash.remove(&field);
          if hash.is_empty() {
            self.hashes.remove(&key);
          }
        }
      }
      Mutation::HIncrBy { key, field, by } => {
        let hash = self.hashes.entry(key).or_default();
        let value = increment(hash.get(&field).map(Vec::as_slice), by)?;
        hash.insert(field, value);
      }
      Mutation::ZAdd { key, score, member } => {
        self.sorted_sets.entry(key).or_default().insert(member, score);
      }
      Mutation::RPush { key, value } => {
        self.lists.entry(key).or_default().push(value);
      }
    }

    Ok(())
  }

  fn clear(&mut self, key: &str) {
    self.scalars.remove(key);
    self.hashes.remove(key);
    self.sorted_sets.remove(key);
    self.lists.remove(key);
  }

  /// Moves everything stored under `key` into `other`.
  fn take(&mut self, key: &str, other: &mut Tables) {
    if let Some(value) = self.scalars.remove(key) {
      other.scalars.insert(key.into(), value);
    }
    if let Some(hash) = self.hashes.remove(key) {
      other.hashes.insert(key.into(), hash);
    }
    if let Some(set) = self.sorted_sets.remove(key) {
      other.sorted_sets.insert(key.into(), set);
    }
    if let Some(list) = self.lists.remove(key) {
      other.lists.insert(key.into(), list);
    }
  }
}

/// Keeps the whole key space in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
    self
      .tables
      .lock()
      .map_err(|_| anyhow!("memory store lock poisoned"))
  }
}

impl StoreRead for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(self.lock()?.scalars.get(key).cloned())
  }

  fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
    Ok(
      self
        .lock()?
        .hashes
        .get(key)
        .and_then(|hash| hash.get(field))
        .cloned(),
    )
  }

  fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
    Ok(
      self
        .lock()?
        .hashes
        .get(key)
        .map(|hash| {
          hash
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
        })
        .unwrap_or_default(),
    )
  }

  fn zrange(&self, key: &str) -> Result<Vec<(u64, String)>> {
    let mut members = self
      .lock()?
      .sorted_sets
      .get(key)
      .map(|set| {
        set
          .iter()
          .map(|(member, score)| (*score, member.clone()))
          .collect::<Vec<(u64, String)>>()
      })
      .unwrap_or_default();

    members.sort();

    Ok(members)
  }

  fn lrange(&self, key: &str) -> Result<Vec<Vec<u8>>> {
    Ok(self.lock()?.lists.get(key).cloned().unwrap_or_default())
  }
}

impl Store for MemoryStore {
  fn apply(&self, batch: Batch) -> Result {
    let mut tables = self.lock()?;

    let keys = batch
      .mutations()
      .iter()
      .map(|mutation| mutation.key().to_string())
      .collect::<std::collections::BTreeSet<String>>();

    // the touched keys are applied on a copy and swapped in on success
    let mut scratch = Tables::default();
    for key in &keys {
      if let Some(value) = tables.scalars.get(key) {
        scratch.scalars.insert(key.clone(), value.clone());
      }
      if let Some(hash) = tables.hashes.get(key) {
        scratch.hashes.insert(key.clone(), hash.clone());
      }
      if let Some(set) = tables.sorted_sets.get(key) {
        scratch.sorted_sets.insert(key.clone(), set.clone());
      }
      if let Some(list) = tables.lists.get(key) {
        scratch.lists.insert(key.clone(), list.clone());
      }
    }

    for mutation in batch {
      scratch.apply(mutation)?;
    }

    for key in &keys {
      tables.clear(key);
      scratch.take(key, &mut tables);
    }

    Ok(())
  }
}
