use super::*;

pub(crate) fn run(settings: Settings) -> SubcommandResult {
  settings.explorer_url()?;

  let index = Arc::new(Index::open(&settings)?);

  pipeline::catch_up(index.clone())?;

  Ok(Some(Box::new(status::Output::new(&index)?)))
}
