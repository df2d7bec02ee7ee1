use {
  self::{
    block_updater::BlockUpdater, drc20_updater::Drc20Updater,
    inscription_updater::InscriptionUpdater,
  },
  super::*,
};

mod block_updater;
mod drc20_updater;
mod inscription_updater;

/// Runs one stage over one block. Every write of the block, including the
/// checkpoint, is committed as a single batch, so a failed attempt leaves
/// nothing behind.
pub(crate) struct Updater<'index> {
  height: u32,
  index: &'index Index,
}

impl<'index> Updater<'index> {
  pub(crate) fn new(index: &'index Index, height: u32) -> Self {
    Self { height, index }
  }

  pub(crate) fn update(&self, stage: Stage, checkpoint: Option<&str>) -> Result {
    let start = Instant::now();

    let mut staged = Staged::new(self.index.store());

    match stage {
      Stage::FetchBlocks => BlockUpdater {
        height: self.height,
        index: self.index,
      }
      .index_block(&mut staged)?,
      Stage::InscriptionTransfers => InscriptionUpdater {
        height: self.height,
        index: self.index,
      }
      .index_transfers(&mut staged)?,
      Stage::Drc20 => Drc20Updater {
        height: self.height,
        protocols: self.index.settings().protocols(),
      }
      .index_transfers(&mut staged)?,
    }

    if let Some(name) = checkpoint {
      status::set(&mut staged, name, self.height)?;
    }

    let writes = staged.batch().len();

    staged.commit()?;

    log::info!(
      "{stage} | finished block {} in {}ms ({writes} writes)",
      self.height,
      start.elapsed().as_millis()
    );

    Ok(())
  }
}
