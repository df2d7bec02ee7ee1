use super::*;

#[derive(Default)]
struct HashOverlay {
  cleared: bool,
  fields: BTreeMap<String, Option<Vec<u8>>>,
}

#[derive(Default)]
struct SortedSetOverlay {
  cleared: bool,
  members: BTreeMap<String, u64>,
}

#[derive(Default)]
struct ListOverlay {
  cleared: bool,
  pushed: Vec<Vec<u8>>,
}

/// Buffers the writes of one unit of work over a store. Reads observe the
/// buffered writes, and nothing reaches the store until `commit` applies
/// them as a single batch.
pub struct Staged<'store> {
  batch: Batch,
  hashes: HashMap<String, HashOverlay>,
  lists: HashMap<String, ListOverlay>,
  scalars: HashMap<String, Option<Vec<u8>>>,
  sorted_sets: HashMap<String, SortedSetOverlay>,
  store: &'store dyn Store,
}

impl<'store> Staged<'store> {
  pub fn new(store: &'store dyn Store) -> Self {
    Self {
      batch: Batch::default(),
      hashes: HashMap::new(),
      lists: HashMap::new(),
      scalars: HashMap::new(),
      sorted_sets: HashMap::new(),
      store,
    }
  }

  pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
    let key = key.into();
    self.scalars.insert(key.clone(), Some(value.clone()));
    self.batch.push(Mutation::Set { key, value });
  }

  pub fn del(&mut self, key: impl Into<String>) {
    let key = key.into();
    self.scalars.insert(key.clone(), None);
    self.hashes.insert(
      key.clone(),
      HashOverlay {
        cleared: true,
        ..Default::default()
      },
    );
    self.sorted_sets.insert(
      key.clone(),
      SortedSetOverlay {
        cleared: true,
        ..Default::default()
      },
    );
    self.lists.insert(
      key.clone(),
      ListOverlay {
        cleared: true,
        ..Default::default()
      },
    );
    self.batch.push(Mutation::Del { key });
  }

  pub fn hset(&mut self, key: impl Into<String>, field: impl Into<String>, value: Vec<u8>) {
    let (key, field) = (key.into(), field.into());
    self
      .hashes
      .entry(key.clone())
      .or_default()
      .fields
      .insert(field.clone(), Some(value.clone()));
    self.batch.push(Mutation::HSet { key, field, value });
  }

  pub fn hdel(&mut self, key: impl Into<String>, field: impl Into<String>) {
    let (key, field) = (key.into(), field.into());
    self
      .hashes
      .entry(key.clone())
      .or_default()
      .fields
      .insert(field.clone(), None);
    self.batch.push(Mutation::HDel { key, field });
  }

  pub fn hincrby(&mut self, key: impl Into<String>, field: impl Into<String>, by: i64) -> Result {
    let (key, field) = (key.into(), field.into());
    let value = increment(self.hget(&key, &field)?.as_deref(), by)?;
    self
      .hashes
      .entry(key.clone())
      .or_default()
      .fields
      .insert(field.clone(), Some(value));
    self.batch.push(Mutation::HIncrBy { key, field, by });
    Ok(())
  }

  pub fn zadd(&mut self, key: impl Into<String>, score: u64, member: impl Into<String>) {
    let (key, member) = (key.into(), member.into());
    self
      .sorted_sets
      .entry(key.clone())
      .or_default()
      .members
      .insert(member.clone(), score);
    self.batch.push(Mutation::ZAdd { key, score, member });
  }

  pub fn rpush(&mut self, key: impl Into<String>, value: Vec<u8>) {
    let key = key.into();
    self
      .lists
      .entry(key.clone())
      .or_default()
      .pushed
      .push(value.clone());
    self.batch.push(Mutation::RPush { key, value });
  }

  pub fn batch(&self) -> &Batch {
    &self.batch
  }

  pub fn commit(self) -> Result {
    if self.batch.is_empty() {
      return Ok(());
    }

    self.store.apply(self.batch)
  }
}

impl StoreRead for Staged<'_> {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    match self.scalars.get(key) {
      Some(value) => Ok(value.clone()),
      None => self.store.get(key),
    }
  }

  fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
    match self.hashes.get(key) {
      Some(overlay) => match overlay.fields.get(field) {
        Some(value) => Ok(value.clone()),
        None if overlay.cleared => Ok(None),
        None => self.store.hget(key, field),
      },
      None => self.store.hget(key, field),
    }
  }

  fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let Some(overlay) = self.hashes.get(key) else {
      return self.store.hgetall(key);
    };

    let mut fields = if overlay.cleared {
      BTreeMap::new()
    } else {
      self
        .store
        .hgetall(key)?
        .into_iter()
        .collect::<BTreeMap<String, Vec<u8>>>()
    };

    for (field, value) in &overlay.fields {
      match value {
        Some(value) => {
          fields.insert(field.clone(), value.clone());
        }
        None => {
          fields.remove(field);
        }
      }
    }

    Ok(fields.into_iter().collect())
  }

  fn zrange(&self, key: &str) -> Result<Vec<(u64, String)>> {
    let Some(overlay) = self.sorted_sets.get(key) else {
      return self.store.zrange(key);
    };

    let mut members = if overlay.cleared {
      BTreeMap::new()
    } else {
      self
        .store
        .zrange(key)?
        .into_iter()
        .map(|(score, member)| (member, score))
        .collect::<BTreeMap<String, u64>>()
    };

    members.extend(
      overlay
        .members
        .iter()
        .map(|(member, score)| (member.clone(), *score)),
    );

    let mut members = members
      .into_iter()
      .map(|(member, score)| (score, member))
      .collect::<Vec<(u64, String)>>();

    members.sort();

    Ok(members)
  }

  fn lrange(&self, key: &str) -> Result<Vec<Vec<u8>>> {
    let Some(overlay) = self.lists.get(key) else {
      return self.store.lrange(key);
    };

    let mut items = if overlay.cleared {
      Vec::new()
    } else {
      self.store.lrange(key)?
    };

    items.extend(overlay.pushed.iter().cloned());

    Ok(items)
  }
}
