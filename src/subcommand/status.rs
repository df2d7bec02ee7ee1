use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub chain: Chain,
  pub checkpoints: BTreeMap<String, Option<u32>>,
}

impl Output {
  pub(crate) fn new(index: &Index) -> Result<Self> {
    let mut checkpoints = BTreeMap::new();

    checkpoints.insert(STARTUP.to_string(), index.checkpoint(STARTUP)?);

    for stage in Stage::ALL {
      checkpoints.insert(stage.to_string(), index.checkpoint(stage.name())?);
    }

    Ok(Self {
      chain: index.settings().chain(),
      checkpoints,
    })
  }
}

pub(crate) fn run(settings: Settings) -> SubcommandResult {
  let index = Index::open(&settings)?;
  Ok(Some(Box::new(Output::new(&index)?)))
}
