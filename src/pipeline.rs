use {
  super::*,
  crate::provider::with_retries,
  futures::future::try_join_all,
  indicatif::{ProgressBar, ProgressStyle},
};

/// Runs each of `stages` on its own thread until shutdown is requested or
/// every stage has passed the configured end block.
pub fn run(index: Arc<Index>, stages: &[Stage]) -> Result {
  let handles = stages
    .iter()
    .map(|&stage| {
      let index = index.clone();
      thread::Builder::new()
        .name(stage.name().into())
        .spawn(move || run_stage(&index, stage))
    })
    .collect::<io::Result<Vec<thread::JoinHandle<Result>>>>()?;

  for handle in handles {
    handle
      .join()
      .map_err(|_| anyhow!("stage thread panicked"))??;
  }

  Ok(())
}

/// Indexes `stage` one block at a time, starting after its checkpoint. A
/// failed block is retried until it succeeds.
pub fn run_stage(index: &Index, stage: Stage) -> Result {
  let settings = index.settings();

  let mut height = match index.checkpoint(stage.name())? {
    Some(checkpoint) => checkpoint + 1,
    None => settings.first_block(),
  };

  log::info!("{stage} | starting at block {height}");

  loop {
    if SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
      log::info!("{stage} | shutting down at block {height}");
      return Ok(());
    }

    if let Some(end_block) = settings.end_block()
      && height > end_block
    {
      log::info!("{stage} | reached end block {end_block}");
      return Ok(());
    }

    match ready(index, stage, height) {
      Ok(true) => {}
      Ok(false) => continue,
      Err(err) => {
        log::error!("{stage} | failed to check block {height}: {err:#}");
        pause(settings.failure_wait());
        continue;
      }
    }

    match index.index_block(stage, height) {
      Ok(()) => height += 1,
      Err(err) => {
        log::error!("{stage} | failed to index block {height}, retrying: {err:#}");
        pause(settings.failure_wait());
      }
    }
  }
}

/// Whether `stage` may index `height` now. Pauses and returns `false` while
/// the upstream stage lags or the block is too close to the chain head.
fn ready(index: &Index, stage: Stage, height: u32) -> Result<bool> {
  let settings = index.settings();

  if let Some(upstream) = stage.upstream() {
    let mut required = height.saturating_add(settings.stage_lag());

    if let Some(end_block) = settings.end_block() {
      required = required.min(end_block);
    }

    let checkpoint = index.checkpoint(upstream.name())?;

    if checkpoint.is_none_or(|checkpoint| checkpoint < required) {
      log::info!(
        "{stage} | waiting for {upstream} to reach block {required}, currently at {}",
        checkpoint.map_or_else(|| "none".into(), |checkpoint| checkpoint.to_string())
      );
      pause(settings.lag_wait());
      return Ok(false);
    }
  }

  if let Some(margin) = settings.slow_down() {
    let head = index.chain_head()?;

    if height > head.saturating_sub(margin).saturating_add(1) {
      log::info!("{stage} | slowing down, block {height} within {margin} blocks of head {head}");
      pause(settings.lag_wait());
      return Ok(false);
    }
  }

  Ok(true)
}

/// Fetches blocks from the startup block up to the start block in parallel
/// batches, then hands the fetch stage the startup checkpoint.
pub fn catch_up(index: Arc<Index>) -> Result {
  let settings = index.settings();

  let start_block = settings.start_block();

  let mut height = match index.checkpoint(STARTUP)? {
    Some(checkpoint) => checkpoint + 1,
    None => settings.startup_block(),
  };

  if height < start_block {
    log::info!("catching up from block {height} to {start_block}");
  }

  let progress_bar = if cfg!(test) || log::log_enabled!(log::Level::Info) || height >= start_block {
    None
  } else {
    let progress_bar = ProgressBar::new((start_block - height).into());
    progress_bar.set_style(ProgressStyle::with_template(
      "[catching up] {wide_bar} {pos}/{len}",
    )?);
    Some(progress_bar)
  };

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;

  while height < start_block {
    if SHUTTING_DOWN.load(atomic::Ordering::Relaxed) {
      log::info!("catch-up interrupted at block {height}");
      return Ok(());
    }

    let end = height
      .saturating_add(settings.catch_up_batch_size())
      .min(start_block);

    let tasks = (height..end).map(|block| {
      let index = index.clone();
      async move {
        tokio::task::spawn_blocking(move || {
          let settings = index.settings();
          with_retries(
            settings.catch_up_retries(),
            settings.provider_retry_interval(),
            || format!("catch up block {block}"),
            || index.fetch_block_unchecked(block),
          )
        })
        .await?
      }
    });

    match runtime.block_on(try_join_all(tasks)) {
      Ok(_) => {
        index.set_checkpoint(STARTUP, end - 1)?;

        if let Some(progress_bar) = &progress_bar {
          progress_bar.inc((end - height).into());
        }

        log::info!("caught up blocks {height}..{end}");

        height = end;
      }
      Err(err) => {
        log::error!("failed to catch up blocks {height}..{end}, retrying: {err:#}");
        pause(settings.failure_wait());
      }
    }
  }

  if let Some(progress_bar) = progress_bar {
    progress_bar.finish();
  }

  if let Some(checkpoint) = index.checkpoint(STARTUP)? {
    index.set_checkpoint(Stage::FetchBlocks.name(), checkpoint)?;
    log::info!("catch-up complete, {} resumes after block {checkpoint}", Stage::FetchBlocks);
  }

  Ok(())
}
