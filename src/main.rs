use std::env::args;
use std::str::FromStr;
use std::string::ToString;

use env_logger::Env;
use shared_counter::{run_trials, run_with, trials::trial_config, DemoConfig, Strategy};
use strum::IntoEnumIterator;
use strum_macros::{self, Display, EnumIter, EnumString};

const DEFAULT_TRIALS: usize = 100;

fn main() -> Result<(), String> {
    let args = args().skip(1).collect::<Vec<String>>();
    let command = args
        .first()
        .ok_or(format!(
            "no command supplied, use one of {}",
            list::<Command>()
        ))
        .and_then(|selector| {
            Command::from_str(selector).map_err(|_| {
                format!("unknown command `{selector}', use one of {}", list::<Command>())
            })
        })?;

    let filter = match command {
        Command::Run => "debug",
        Command::Trials => "info",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    let config = config_from(&command, &args[1..])?;
    match command {
        Command::Run => run_with(&config).map(|_| ()),
        Command::Trials => {
            let trials = number_at(&args, 4)?.unwrap_or(DEFAULT_TRIALS);
            run_trials(&config, trials).map(|_| ())
        }
    }
    .map_err(|e| e.to_string())
}

/// `[strategy] [iterations] [writers]`, whatever's missing stays default for the command
fn config_from(command: &Command, args: &[String]) -> Result<DemoConfig, String> {
    let strategy = args
        .first()
        .map(|s| {
            Strategy::from_str(s)
                .map_err(|_| format!("unknown strategy `{s}', use one of {}", list::<Strategy>()))
        })
        .transpose()?
        .unwrap_or_default();
    let mut config = match command {
        Command::Run => DemoConfig::new(strategy),
        Command::Trials => trial_config(strategy),
    };
    if let Some(iterations) = number_at(args, 1)? {
        config = config.with_iterations(iterations);
    }
    if let Some(writers) = number_at(args, 2)? {
        config = config.with_writers(writers);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn number_at(args: &[String], idx: usize) -> Result<Option<usize>, String> {
    args.get(idx)
        .map(|n| n.parse().map_err(|e| format!("bad number `{n}': {e}")))
        .transpose()
}

fn list<Y: IntoEnumIterator + ToString>() -> String {
    Y::iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join(",")
}

#[derive(EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Command {
    Run,
    Trials,
}

#[cfg(test)]
mod test {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_unsynchronized_trials_default_to_two_writers() {
        let config = config_from(&Command::Trials, &strings(&["unsynchronized"])).unwrap();
        assert_eq!(2, config.writers);
        assert!(config.reader_timeout.is_some());

        // a single run stays the plain two-thread demo
        let config = config_from(&Command::Run, &strings(&["unsynchronized"])).unwrap();
        assert_eq!(1, config.writers);
        assert_eq!(None, config.reader_timeout);
    }

    #[test]
    fn test_explicit_writers_win() {
        let config =
            config_from(&Command::Trials, &strings(&["unsynchronized", "500", "3"])).unwrap();
        assert_eq!(500, config.iterations);
        assert_eq!(3, config.writers);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(config_from(&Command::Run, &strings(&["volatile"])).is_err());
        assert!(config_from(&Command::Run, &strings(&["atomic", "many"])).is_err());
        assert!(config_from(&Command::Run, &strings(&["atomic", "10", "0"])).is_err());
    }
}
