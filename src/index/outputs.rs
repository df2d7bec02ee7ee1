use super::*;

fn key(outpoint: OutPoint) -> String {
  format!("output:{outpoint}")
}

fn list_key(txid: Txid) -> String {
  format!("tx:{txid}:outputs")
}

fn address_key(address: &str) -> String {
  format!("address:{}", address.to_lowercase())
}

pub(crate) fn get(store: &dyn StoreRead, outpoint: OutPoint) -> Result<Option<OutputEntry>> {
  store
    .get(&key(outpoint))?
    .map(|value| OutputEntry::load(&value))
    .transpose()
}

/// Outpoints recorded for `txid`, in the order they were written.
pub(crate) fn outpoints(store: &dyn StoreRead, txid: Txid) -> Result<Vec<OutPoint>> {
  store
    .lrange(&list_key(txid))?
    .into_iter()
    .map(|vout| {
      let vout = String::from_utf8(vout)?.parse::<u32>()?;
      Ok(OutPoint { txid, vout })
    })
    .collect()
}

/// Records an output created by a transaction. Inscriptions already carried
/// by a previous write of the same output are kept.
pub(crate) fn write(staged: &mut Staged, mut entry: OutputEntry) -> Result {
  let outpoint = entry.outpoint;

  if let Some(existing) = get(staged, outpoint)? {
    for inscription in existing.inscriptions {
      if !entry.inscriptions.contains(&inscription) {
        entry.inscriptions.push(inscription);
      }
    }
  }

  let vout = outpoint.vout.to_string();

  if staged
    .lrange(&list_key(outpoint.txid))?
    .iter()
    .any(|existing| existing == vout.as_bytes())
  {
    log::debug!("output {outpoint} already listed for {}", outpoint.txid);
  } else {
    staged.rpush(list_key(outpoint.txid), vout.into_bytes());
  }

  if let Some(address) = &entry.address {
    staged.set(address_key(address), address.clone().into_bytes());
  }

  staged.set(key(outpoint), entry.store()?);

  Ok(())
}

/// Attaches `inscription` to an output. Adding an inscription the output
/// already carries is a no-op.
pub(crate) fn add_inscription(
  staged: &mut Staged,
  outpoint: OutPoint,
  inscription: InscriptionId,
) -> Result {
  let mut entry = get(staged, outpoint)?.ok_or(SnafuError::MissingOutput {
    outpoint,
    txid: outpoint.txid,
  })?;

  let mut seen = entry.inscriptions.clone();
  seen.sort();
  if let Some(duplicate) = seen.windows(2).find(|pair| pair[0] == pair[1]) {
    return Err(
      SnafuError::DuplicateInscription {
        inscription: duplicate[0],
        outpoint,
      }
      .into(),
    );
  }

  if entry.inscriptions.contains(&inscription) {
    return Ok(());
  }

  entry.inscriptions.push(inscription);

  staged.set(key(outpoint), entry.store()?);

  Ok(())
}

/// Original spelling of an address seen on an output.
pub(crate) fn address(store: &dyn StoreRead, address: &str) -> Result<Option<String>> {
  store
    .get(&address_key(address))?
    .map(|value| Ok(String::from_utf8(value)?))
    .transpose()
}
