use super::*;

#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  catch_up_batch_size: Option<u32>,
  catch_up_retries: Option<u32>,
  chain: Option<Chain>,
  data_dir: Option<PathBuf>,
  end_block: Option<u32>,
  explorer_url: Option<String>,
  failure_wait_ms: Option<u64>,
  in_memory: bool,
  index: Option<PathBuf>,
  inscription_wait_height: Option<u32>,
  inscription_wait_ms: Option<u64>,
  lag_wait_ms: Option<u64>,
  output_cache_size: Option<usize>,
  protocols: Option<Vec<String>>,
  provider_retries: Option<u32>,
  provider_retry_interval_ms: Option<u64>,
  slow_down: Option<u32>,
  stage_lag: Option<u32>,
  start_block: Option<u32>,
  startup_block: Option<u32>,
}

impl Settings {
  const CATCH_UP_BATCH_SIZE: u32 = 100;
  const CATCH_UP_RETRIES: u32 = 1000;
  const FAILURE_WAIT_MS: u64 = 5_000;
  const INSCRIPTION_WAIT_MS: u64 = 10_000;
  const LAG_WAIT_MS: u64 = 10_000;
  const OUTPUT_CACHE_SIZE: usize = 100_000;
  const PROVIDER_RETRIES: u32 = 1000;
  const PROVIDER_RETRY_INTERVAL_MS: u64 = 1000;
  const STAGE_LAG: u32 = 2;

  pub fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
    let config_path = match (&options.config, &options.config_dir) {
      (Some(path), _) => Some(path.clone()),
      (None, Some(dir)) => Some(dir.join("doge20.yaml")),
      (None, None) => None,
    };

    let settings = Settings::from_options(options).or(Settings::from_env(env)?);

    let config = match config_path {
      Some(path) => {
        let file = File::open(&path).snafu_context(error::Io { path: path.clone() })?;
        serde_yaml::from_reader(file)
          .with_context(|| format!("failed to deserialize config file `{}`", path.display()))?
      }
      None => Settings::default(),
    };

    settings.or(config).or_defaults()
  }

  pub fn or(self, source: Settings) -> Self {
    Self {
      catch_up_batch_size: self.catch_up_batch_size.or(source.catch_up_batch_size),
      catch_up_retries: self.catch_up_retries.or(source.catch_up_retries),
      chain: self.chain.or(source.chain),
      data_dir: self.data_dir.or(source.data_dir),
      end_block: self.end_block.or(source.end_block),
      explorer_url: self.explorer_url.or(source.explorer_url),
      failure_wait_ms: self.failure_wait_ms.or(source.failure_wait_ms),
      in_memory: self.in_memory || source.in_memory,
      index: self.index.or(source.index),
      inscription_wait_height: self
        .inscription_wait_height
        .or(source.inscription_wait_height),
      inscription_wait_ms: self.inscription_wait_ms.or(source.inscription_wait_ms),
      lag_wait_ms: self.lag_wait_ms.or(source.lag_wait_ms),
      output_cache_size: self.output_cache_size.or(source.output_cache_size),
      protocols: self.protocols.or(source.protocols),
      provider_retries: self.provider_retries.or(source.provider_retries),
      provider_retry_interval_ms: self
        .provider_retry_interval_ms
        .or(source.provider_retry_interval_ms),
      slow_down: self.slow_down.or(source.slow_down),
      stage_lag: self.stage_lag.or(source.stage_lag),
      start_block: self.start_block.or(source.start_block),
      startup_block: self.startup_block.or(source.startup_block),
    }
  }

  pub fn from_options(options: Options) -> Self {
    Self {
      catch_up_batch_size: options.catch_up_batch_size,
      catch_up_retries: options.catch_up_retries,
      chain: options
        .chain_argument
        .or(options.regtest.then_some(Chain::DogecoinRegtest))
        .or(options.testnet.then_some(Chain::DogecoinTestnet)),
      data_dir: options.data_dir,
      end_block: options.end_block,
      explorer_url: options.explorer_url,
      failure_wait_ms: options.failure_wait_ms,
      in_memory: options.in_memory,
      index: options.index,
      inscription_wait_height: options.inscription_wait_height,
      inscription_wait_ms: options.inscription_wait_ms,
      lag_wait_ms: options.lag_wait_ms,
      output_cache_size: options.output_cache_size,
      protocols: (!options.protocols.is_empty()).then_some(options.protocols),
      provider_retries: options.provider_retries,
      provider_retry_interval_ms: options.provider_retry_interval_ms,
      slow_down: options.slow_down,
      stage_lag: options.stage_lag,
      start_block: options.start_block,
      startup_block: options.startup_block,
    }
  }

  pub fn from_env(env: BTreeMap<String, String>) -> Result<Self> {
    Ok(Self {
      catch_up_batch_size: parse_env(&env, "CATCH_UP_BATCH_SIZE")?,
      catch_up_retries: parse_env(&env, "CATCH_UP_RETRIES")?,
      chain: parse_env(&env, "CHAIN")?,
      data_dir: env.get("DATA_DIR").map(PathBuf::from),
      end_block: parse_env(&env, "END_BLOCK")?,
      explorer_url: env.get("EXPLORER_URL").cloned(),
      failure_wait_ms: parse_env(&env, "FAILURE_WAIT_MS")?,
      in_memory: env
        .get("IN_MEMORY")
        .map(|value| !value.is_empty())
        .unwrap_or_default(),
      index: env.get("INDEX").map(PathBuf::from),
      inscription_wait_height: parse_env(&env, "INSCRIPTION_WAIT_HEIGHT")?,
      inscription_wait_ms: parse_env(&env, "INSCRIPTION_WAIT_MS")?,
      lag_wait_ms: parse_env(&env, "LAG_WAIT_MS")?,
      output_cache_size: parse_env(&env, "OUTPUT_CACHE_SIZE")?,
      protocols: env.get("PROTOCOLS").map(|protocols| {
        protocols
          .split(',')
          .map(str::trim)
          .filter(|protocol| !protocol.is_empty())
          .map(str::to_owned)
          .collect()
      }),
      provider_retries: parse_env(&env, "PROVIDER_RETRIES")?,
      provider_retry_interval_ms: parse_env(&env, "PROVIDER_RETRY_INTERVAL_MS")?,
      slow_down: parse_env(&env, "SLOW_DOWN")?,
      stage_lag: parse_env(&env, "STAGE_LAG")?,
      start_block: parse_env(&env, "START_BLOCK")?,
      startup_block: parse_env(&env, "STARTUP_BLOCK")?,
    })
  }

  pub fn or_defaults(self) -> Result<Self> {
    let chain = self.chain.unwrap_or_default();

    let data_dir = chain.join_with_data_dir(match &self.data_dir {
      Some(data_dir) => data_dir.clone(),
      None => Self::default_data_dir()?,
    });

    let index = self
      .index
      .clone()
      .unwrap_or_else(|| data_dir.join("index.redb"));

    let start_block = self
      .start_block
      .unwrap_or(chain.first_inscription_height());

    let startup_block = self.startup_block.unwrap_or(start_block);

    if let Some(end_block) = self.end_block
      && end_block < start_block.min(startup_block)
    {
      return Err(
        SnafuError::InvalidConfiguration {
          message: format!(
            "end block {end_block} precedes first block {}",
            start_block.min(startup_block)
          ),
        }
        .into(),
      );
    }

    if self.catch_up_batch_size == Some(0) {
      return Err(
        SnafuError::InvalidConfiguration {
          message: "catch-up batch size must be positive".into(),
        }
        .into(),
      );
    }

    Ok(Self {
      catch_up_batch_size: Some(
        self
          .catch_up_batch_size
          .unwrap_or(Self::CATCH_UP_BATCH_SIZE),
      ),
      catch_up_retries: Some(self.catch_up_retries.unwrap_or(Self::CATCH_UP_RETRIES)),
      chain: Some(chain),
      data_dir: Some(data_dir),
      end_block: self.end_block,
      explorer_url: self.explorer_url,
      failure_wait_ms: Some(self.failure_wait_ms.unwrap_or(Self::FAILURE_WAIT_MS)),
      in_memory: self.in_memory,
      index: Some(index),
      inscription_wait_height: Some(
        self
          .inscription_wait_height
          .unwrap_or(chain.inscription_wait_height()),
      ),
      inscription_wait_ms: Some(
        self
          .inscription_wait_ms
          .unwrap_or(Self::INSCRIPTION_WAIT_MS),
      ),
      lag_wait_ms: Some(self.lag_wait_ms.unwrap_or(Self::LAG_WAIT_MS)),
      output_cache_size: Some(self.output_cache_size.unwrap_or(Self::OUTPUT_CACHE_SIZE)),
      protocols: Some(
        self
          .protocols
          .unwrap_or_else(|| vec![drc20::DEFAULT_PROTOCOL.into()]),
      ),
      provider_retries: Some(self.provider_retries.unwrap_or(Self::PROVIDER_RETRIES)),
      provider_retry_interval_ms: Some(
        self
          .provider_retry_interval_ms
          .unwrap_or(Self::PROVIDER_RETRY_INTERVAL_MS),
      ),
      slow_down: self.slow_down,
      stage_lag: Some(self.stage_lag.unwrap_or(Self::STAGE_LAG)),
      start_block: Some(start_block),
      startup_block: Some(startup_block),
    })
  }

  fn default_data_dir() -> Result<PathBuf> {
    Ok(
      dirs::data_dir()
        .context("could not get data dir")?
        .join("doge20"),
    )
  }

  pub fn catch_up_batch_size(&self) -> u32 {
    self
      .catch_up_batch_size
      .unwrap_or(Self::CATCH_UP_BATCH_SIZE)
  }

  pub fn catch_up_retries(&self) -> u32 {
    self.catch_up_retries.unwrap_or(Self::CATCH_UP_RETRIES)
  }

  pub fn chain(&self) -> Chain {
    self.chain.unwrap_or_default()
  }

  pub fn data_dir(&self) -> Option<&Path> {
    self.data_dir.as_deref()
  }

  pub fn end_block(&self) -> Option<u32> {
    self.end_block
  }

  pub fn explorer_url(&self) -> Result<&str, SnafuError> {
    self
      .explorer_url
      .as_deref()
      .ok_or_else(|| SnafuError::InvalidConfiguration {
        message: "no explorer url configured, use `--explorer-url`".into(),
      })
  }

  pub fn failure_wait(&self) -> Duration {
    Duration::from_millis(self.failure_wait_ms.unwrap_or(Self::FAILURE_WAIT_MS))
  }

  /// First block a stage without a checkpoint indexes.
  pub fn first_block(&self) -> u32 {
    self.start_block().min(self.startup_block())
  }

  pub fn in_memory(&self) -> bool {
    self.in_memory
  }

  pub fn index(&self) -> Option<&Path> {
    self.index.as_deref()
  }

  pub fn inscription_wait_height(&self) -> u32 {
    self
      .inscription_wait_height
      .unwrap_or(self.chain().inscription_wait_height())
  }

  pub fn inscription_wait(&self) -> Duration {
    Duration::from_millis(
      self
        .inscription_wait_ms
        .unwrap_or(Self::INSCRIPTION_WAIT_MS),
    )
  }

  pub fn lag_wait(&self) -> Duration {
    Duration::from_millis(self.lag_wait_ms.unwrap_or(Self::LAG_WAIT_MS))
  }

  pub fn output_cache_size(&self) -> usize {
    self.output_cache_size.unwrap_or(Self::OUTPUT_CACHE_SIZE)
  }

  pub fn protocols(&self) -> &[String] {
    self.protocols.as_deref().unwrap_or_default()
  }

  pub fn provider_retries(&self) -> u32 {
    self.provider_retries.unwrap_or(Self::PROVIDER_RETRIES)
  }

  pub fn provider_retry_interval(&self) -> Duration {
    Duration::from_millis(
      self
        .provider_retry_interval_ms
        .unwrap_or(Self::PROVIDER_RETRY_INTERVAL_MS),
    )
  }

  pub fn slow_down(&self) -> Option<u32> {
    self.slow_down
  }

  pub fn stage_lag(&self) -> u32 {
    self.stage_lag.unwrap_or(Self::STAGE_LAG)
  }

  pub fn start_block(&self) -> u32 {
    self
      .start_block
      .unwrap_or(self.chain().first_inscription_height())
  }

  pub fn startup_block(&self) -> u32 {
    self.startup_block.unwrap_or(self.start_block())
  }
}

fn parse_env<T>(env: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  env
    .get(key)
    .map(|value| value.parse::<T>())
    .transpose()
    .with_context(|| format!("failed to parse environment variable DOGE20_{key}"))
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn parse(args: &[&str]) -> Settings {
    let args = ["doge20", "--data-dir", "data"]
      .into_iter()
      .chain(args.iter().copied());
    Settings::merge(Options::try_parse_from(args).unwrap(), BTreeMap::new()).unwrap()
  }

  fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
      .iter()
      .map(|(key, value)| ((*key).into(), (*value).into()))
      .collect()
  }

  #[test]
  fn defaults() {
    let settings = parse(&[]);
    assert_eq!(settings.chain(), Chain::Dogecoin);
    assert_eq!(settings.start_block(), 4_600_000);
    assert_eq!(settings.startup_block(), 4_600_000);
    assert_eq!(settings.first_block(), 4_600_000);
    assert_eq!(settings.end_block(), None);
    assert_eq!(settings.protocols(), ["drc-20".to_string()]);
    assert_eq!(settings.stage_lag(), 2);
    assert_eq!(settings.lag_wait(), Duration::from_secs(10));
    assert_eq!(settings.failure_wait(), Duration::from_secs(5));
    assert_eq!(settings.catch_up_batch_size(), 100);
    assert_eq!(settings.inscription_wait_height(), 4_974_000);
    assert_eq!(settings.slow_down(), None);
    assert_eq!(settings.index(), Some(Path::new("data/index.redb")));
    assert!(!settings.in_memory());
  }

  #[test]
  fn chain_flags() {
    assert_eq!(parse(&["--regtest"]).chain(), Chain::DogecoinRegtest);
    assert_eq!(parse(&["--testnet"]).chain(), Chain::DogecoinTestnet);
    assert_eq!(
      parse(&["--chain", "dogecoin-testnet"]).chain(),
      Chain::DogecoinTestnet
    );
    assert_eq!(
      parse(&["--regtest"]).index(),
      Some(Path::new("data/regtest/index.redb"))
    );
  }

  #[test]
  fn startup_block_precedes_start_block() {
    let settings = parse(&["--start-block", "200", "--startup-block", "100"]);
    assert_eq!(settings.first_block(), 100);
  }

  #[test]
  fn repeated_protocols() {
    assert_eq!(
      parse(&["--protocol", "drc-20", "--protocol", "dog-20"]).protocols(),
      ["drc-20".to_string(), "dog-20".to_string()]
    );
  }

  #[test]
  fn env_is_used_when_options_are_absent() {
    let settings = Settings::merge(
      Options::try_parse_from(["doge20", "--data-dir", "data", "--start-block", "7"]).unwrap(),
      env(&[
        ("START_BLOCK", "5"),
        ("END_BLOCK", "9"),
        ("PROTOCOLS", "drc-20, dog-20"),
        ("CHAIN", "regtest"),
        ("IN_MEMORY", "1"),
      ]),
    )
    .unwrap();

    assert_eq!(settings.start_block(), 7);
    assert_eq!(settings.end_block(), Some(9));
    assert_eq!(settings.chain(), Chain::DogecoinRegtest);
    assert_eq!(
      settings.protocols(),
      ["drc-20".to_string(), "dog-20".to_string()]
    );
    assert!(settings.in_memory());
  }

  #[test]
  fn invalid_env_value() {
    assert_eq!(
      Settings::from_env(env(&[("STAGE_LAG", "two")]))
        .unwrap_err()
        .to_string(),
      "failed to parse environment variable DOGE20_STAGE_LAG"
    );
  }

  #[test]
  fn config_file_has_lowest_precedence() {
    let tempdir = tempfile::tempdir().unwrap();
    let config = tempdir.path().join("doge20.yaml");
    fs::write(
      &config,
      "explorer_url: http://config\nstart_block: 3\nslow_down: 100\n",
    )
    .unwrap();

    let settings = Settings::merge(
      Options::try_parse_from([
        "doge20",
        "--data-dir",
        "data",
        "--config-dir",
        tempdir.path().to_str().unwrap(),
      ])
      .unwrap(),
      env(&[("START_BLOCK", "4")]),
    )
    .unwrap();

    assert_eq!(settings.explorer_url().unwrap(), "http://config");
    assert_eq!(settings.start_block(), 4);
    assert_eq!(settings.slow_down(), Some(100));
  }

  #[test]
  fn unknown_config_fields_are_rejected() {
    let tempdir = tempfile::tempdir().unwrap();
    let config = tempdir.path().join("config.yaml");
    fs::write(&config, "explorer: http://config\n").unwrap();

    assert!(
      Settings::merge(
        Options::try_parse_from(["doge20", "--config", config.to_str().unwrap()]).unwrap(),
        BTreeMap::new(),
      )
      .is_err()
    );
  }

  #[test]
  fn missing_explorer_url() {
    assert_eq!(
      parse(&[]).explorer_url().unwrap_err().to_string(),
      "invalid configuration: no explorer url configured, use `--explorer-url`"
    );
  }

  #[test]
  fn end_block_before_first_block_is_rejected() {
    assert!(
      Settings::merge(
        Options::try_parse_from(["doge20", "--start-block", "10", "--end-block", "9"]).unwrap(),
        BTreeMap::new(),
      )
      .is_err()
    );
  }
}
