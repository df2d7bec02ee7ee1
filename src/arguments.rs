use super::*;

#[derive(Debug, Parser)]
#[command(version)]
pub(crate) struct Arguments {
  #[command(flatten)]
  pub(crate) options: Options,
  #[command(subcommand)]
  pub(crate) subcommand: Subcommand,
}

impl Arguments {
  pub(crate) fn run(self) -> SubcommandResult {
    let mut env: BTreeMap<String, String> = BTreeMap::new();

    for (variable, value) in env::vars_os() {
      let Some(variable) = variable.to_str() else {
        continue;
      };

      let Some(key) = variable.strip_prefix("DOGE20_") else {
        continue;
      };

      env.insert(
        key.into(),
        value.into_string().map_err(|value| {
          error::EnvVarUnicode {
            variable: variable.to_string(),
            value,
          }
          .build()
        })?,
      );
    }

    self.subcommand.run(Settings::merge(self.options, env)?)
  }
}
