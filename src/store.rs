use super::*;

pub use self::{database::RedbStore, memory::MemoryStore, staged::Staged};

mod database;
mod memory;
mod staged;

/// A single write against the key space. Keys are shared between value
/// kinds: deleting a key removes its scalar, hash, sorted set and list.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
  Set {
    key: String,
    value: Vec<u8>,
  },
  Del {
    key: String,
  },
  HSet {
    key: String,
    field: String,
    value: Vec<u8>,
  },
  HDel {
    key: String,
    field: String,
  },
  HIncrBy {
    key: String,
    field: String,
    by: i64,
  },
  ZAdd {
    key: String,
    score: u64,
    member: String,
  },
  RPush {
    key: String,
    value: Vec<u8>,
  },
}

impl Mutation {
  pub fn key(&self) -> &str {
    match self {
      Self::Set { key, .. }
      | Self::Del { key }
      | Self::HSet { key, .. }
      | Self::HDel { key, .. }
      | Self::HIncrBy { key, .. }
      | Self::ZAdd { key, .. }
      | Self::RPush { key, .. } => key,
    }
  }
}

/// Mutations applied atomically and in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Batch {
  mutations: Vec<Mutation>,
}

impl Batch {
  pub fn push(&mut self, mutation: Mutation) {
    self.mutations.push(mutation);
  }

  pub fn is_empty(&self) -> bool {
    self.mutations.is_empty()
  }

  pub fn len(&self) -> usize {
    self.mutations.len()
  }

  pub fn mutations(&self) -> &[Mutation] {
    &self.mutations
  }
}

impl IntoIterator for Batch {
  type Item = Mutation;
  type IntoIter = std::vec::IntoIter<Mutation>;

  fn into_iter(self) -> Self::IntoIter {
    self.mutations.into_iter()
  }
}

impl FromIterator<Mutation> for Batch {
  fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
    Self {
      mutations: iter.into_iter().collect(),
    }
  }
}

pub trait StoreRead {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

  fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
    keys.iter().map(|key| self.get(key)).collect()
  }

  fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

  fn hexists(&self, key: &str, field: &str) -> Result<bool> {
    Ok(self.hget(key, field)?.is_some())
  }

  /// All fields of a hash, ordered by field.
  fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>>;

  /// All members of a sorted set, ordered by score and then member.
  fn zrange(&self, key: &str) -> Result<Vec<(u64, String)>>;

  fn lrange(&self, key: &str) -> Result<Vec<Vec<u8>>>;
}

pub trait Store: StoreRead + Send + Sync {
  fn apply(&self, batch: Batch) -> Result;
}

/// Adds `by` to a counter stored as decimal text.
pub(crate) fn increment(current: Option<&[u8]>, by: i64) -> Result<Vec<u8>> {
  let current = match current {
    Some(bytes) => std::str::from_utf8(bytes)
      .ok()
      .and_then(|text| text.parse::<i64>().ok())
      .ok_or_else(|| anyhow!("hash value is not an integer"))?,
    None => 0,
  };

  Ok(
    current
      .checked_add(by)
      .ok_or_else(|| anyhow!("increment would overflow"))?
      .to_string()
      .into_bytes(),
  )
}
