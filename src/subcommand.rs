use super::*;

pub mod catch_up;
pub mod index;
pub mod status;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Fetch historical blocks in parallel up to the start block")]
  CatchUp,
  #[command(about = "Run the indexing stages")]
  Index(index::Run),
  #[command(about = "Print stage checkpoints")]
  Status,
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::CatchUp => catch_up::run(settings),
      Self::Index(run) => run.run(settings),
      Self::Status => status::run(settings),
    }
  }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Json,
  Yaml,
  Minify,
}

pub trait Output: Send {
  fn print(&self, format: OutputFormat);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print(&self, format: OutputFormat) {
    match format {
      OutputFormat::Json => serde_json::to_writer_pretty(io::stdout(), self).ok(),
      OutputFormat::Yaml => serde_yaml::to_writer(io::stdout(), self).ok(),
      OutputFormat::Minify => serde_json::to_writer(io::stdout(), self).ok(),
    };
    println!();
  }
}

pub(crate) type SubcommandResult = SnafuResult<Option<Box<dyn Output>>>;
