use {
  super::*,
  redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction},
};

macro_rules! define_table {
  ($name:ident, $key:ty, $value:ty) => {
    const $name: TableDefinition<$key, $value> = TableDefinition::new(stringify!($name));
  };
}

define_table! { SCALARS, &str, &[u8] }
define_table! { HASH_FIELDS, (&str, &str), &[u8] }
define_table! { SORTED_SET_MEMBERS, (&str, &str), u64 }
define_table! { SORTED_SET_SCORES, (&str, u64, &str), () }
define_table! { LIST_ITEMS, (&str, u64), &[u8] }

/// Persists the key space in a redb database. Every batch is one write
/// transaction.
pub struct RedbStore {
  database: Database,
}

impl RedbStore {
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).snafu_context(error::Io {
        path: parent.to_path_buf(),
      })?;
    }

    let database = Database::create(path)
      .with_context(|| format!("failed to open index `{}`", path.display()))?;

    let wtx = database.begin_write()?;
    wtx.open_table(SCALARS)?;
    wtx.open_table(HASH_FIELDS)?;
    wtx.open_table(SORTED_SET_MEMBERS)?;
    wtx.open_table(SORTED_SET_SCORES)?;
    wtx.open_table(LIST_ITEMS)?;
    wtx.commit()?;

    log::debug!("opened index at `{}`", path.display());

    Ok(Self { database })
  }

  fn write(wtx: &WriteTransaction, mutation: Mutation) -> Result {
    match mutation {
      Mutation::Set { key, value } => {
        wtx.open_table(SCALARS)?.insert(key.as_str(), value.as_slice())?;
      }
      Mutation::Del { key } => Self::delete(wtx, &key)?,
      Mutation::HSet { key, field, value } => {
        wtx
          .open_table(HASH_FIELDS)?
          .insert((key.as_str(), field.as_str()), value.as_slice())?;
      }
      Mutation::HDel { key, field } => {
        wtx
          .open_table(HASH_FIELDS)?
          .remove((key.as_str(), field.as_str()))?;
      }
      Mutation::HIncrBy { key, field, by } => {
        let mut table = wtx.open_table(HASH_FIELDS)?;
        let current = table
          .get((key.as_str(), field.as_str()))?
          .map(|value| value.value().to_vec());
        let value = increment(current.as_deref(), by)?;
        table.insert((key.as_str(), field.as_str()), value.as_slice())?;
      }
      Mutation::ZAdd { key, score, member } => {
        let mut members = wtx.open_table(SORTED_SET_MEMBERS)?;
        let mut scores = wtx.open_table(SORTED_SET_SCORES)?;

        let previous = members
          .insert((key.as_str(), member.as_str()), score)?
          .map(|previous| previous.value());

        if let Some(previous) = previous {
          scores.remove((key.as_str(), previous, member.as_str()))?;
        }

        scores.insert((key.as_str(), score, member.as_str()), ())?;
      }
      Mutation::RPush { key, value } => {
        let mut items = wtx.open_table(LIST_ITEMS)?;
        let next = items
          .range((key.as_str(), 0)..=(key.as_str(), u64::MAX))?
          .next_back()
          .transpose()?
          .map(|(position, _)| position.value().1 + 1)
          .unwrap_or_default();
        items.insert((key.as_str(), next), value.as_slice())?;
      }
    }

    Ok(())
  }

  fn delete(wtx: &WriteTransaction, key: &str) -> Result {
    wtx.open_table(SCALARS)?.remove(key)?;

    let mut fields = wtx.open_table(HASH_FIELDS)?;
    for field in Self::hash_fields(&fields, key)? {
      fields.remove((key, field.as_str()))?;
    }

    let mut members = wtx.open_table(SORTED_SET_MEMBERS)?;
    let mut scores = wtx.open_table(SORTED_SET_SCORES)?;
    for (score, member) in Self::sorted_set(&scores, key)? {
      members.remove((key, member.as_str()))?;
      scores.remove((key, score, member.as_str()))?;
    }

    let mut items = wtx.open_table(LIST_ITEMS)?;
    let positions = items
      .range((key, 0)..=(key, u64::MAX))?
      .map(|entry| entry.map(|(position, _)| position.value().1))
      .collect::<Result<Vec<u64>, redb::StorageError>>()?;
    for position in positions {
      items.remove((key, position))?;
    }

    Ok(())
  }

  fn hash_fields(
    table: &impl ReadableTable<(&'static str, &'static str), &'static [u8]>,
    key: &str,
  ) -> Result<Vec<String>> {
    let mut fields = Vec::new();

    for entry in table.range((key, "")..)? {
      let (field, _) = entry?;
      let (entry_key, field) = field.value();
      if entry_key != key {
        break;
      }
      fields.push(field.to_string());
    }

    Ok(fields)
  }

  fn sorted_set(
    table: &impl ReadableTable<(&'static str, u64, &'static str), ()>,
    key: &str,
  ) -> Result<Vec<(u64, String)>> {
    let mut members = Vec::new();

    for entry in table.range((key, 0, "")..)? {
      let (member, _) = entry?;
      let (entry_key, score, member) = member.value();
      if entry_key != key {
        break;
      }
      members.push((score, member.to_string()));
    }

    Ok(members)
  }
}

impl StoreRead for RedbStore {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(
      self
        .database
        .begin_read()?
        .open_table(SCALARS)?
        .get(key)?
        .map(|value| value.value().to_vec()),
    )
  }

  fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
    let table = self.database.begin_read()?.open_table(SCALARS)?;

    keys
      .iter()
      .map(|key| {
        Ok(
          table
            .get(key.as_str())?
            .map(|value| value.value().to_vec()),
        )
      })
      .collect()
  }

  fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
    Ok(
      self
        .database
        .begin_read()?
        .open_table(HASH_FIELDS)?
        .get((key, field))?
        .map(|value| value.value().to_vec()),
    )
  }

  fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let table = self.database.begin_read()?.open_table(HASH_FIELDS)?;

    let mut fields = Vec::new();

    for entry in table.range((key, "")..)? {
      let (field, value) = entry?;
      let (entry_key, field) = field.value();
      if entry_key != key {
        break;
      }
      fields.push((field.to_string(), value.value().to_vec()));
    }

    Ok(fields)
  }

  fn zrange(&self, key: &str) -> Result<Vec<(u64, String)>> {
    Self::sorted_set(
      &self.database.begin_read()?.open_table(SORTED_SET_SCORES)?,
      key,
    )
  }

  fn lrange(&self, key: &str) -> Result<Vec<Vec<u8>>> {
    self
      .database
      .begin_read()?
      .open_table(LIST_ITEMS)?
      .range((key, 0)..=(key, u64::MAX))?
      .map(|entry| Ok(entry?.1.value().to_vec()))
      .collect()
  }
}

impl Store for RedbStore {
  fn apply(&self, batch: Batch) -> Result {
    let wtx = self.database.begin_write()?;

    for mutation in batch {
      Self::write(&wtx, mutation)?;
    }

    wtx.commit()?;

    Ok(())
  }
}

