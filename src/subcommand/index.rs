use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Run {
  #[arg(
    long,
    value_enum,
    help = "Only run <STAGE>. Runs every stage on its own thread when omitted."
  )]
  pub(crate) stage: Option<Stage>,
}

impl Run {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    settings.explorer_url()?;

    let index = Arc::new(Index::open(&settings)?);

    let stages = match self.stage {
      Some(stage) => vec![stage],
      None => Stage::ALL.to_vec(),
    };

    pipeline::run(index.clone(), &stages)?;

    Ok(Some(Box::new(status::Output::new(&index)?)))
  }
}
