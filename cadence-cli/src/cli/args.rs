//! CLI argument definitions for `cadence-cli`.

use clap::{Arg, ArgAction, Command};

fn config_arg() -> Arg {
    Arg::new("CONFIG")
        .help("Path to an engine configuration JSON file")
        .required(true)
        .index(1)
}

fn transition_arg() -> Arg {
    Arg::new("transition-ms")
        .long("transition-ms")
        .short('t')
        .value_name("MS")
        .value_parser(clap::value_parser!(f64))
        .help("Crossfade duration in milliseconds (overrides the config file)")
}

fn seed_arg() -> Arg {
    Arg::new("seed")
        .long("seed")
        .value_name("SEED")
        .value_parser(clap::value_parser!(u64))
        .help("Seed for volume, pitch, and variant randomization")
}

fn debug_arg() -> Arg {
    Arg::new("debug")
        .long("debug")
        .short('d')
        .action(ArgAction::SetTrue)
        .help("Log verbose pool activity")
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("cadence")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Adam Howard <adam.thomas.howard@gmail.com>")
        .about("Pooled sound playback and single-track crossfading")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Open the interactive soundboard")
                .arg(config_arg())
                .arg(
                    Arg::new("gain")
                        .long("gain")
                        .short('g')
                        .value_name("GAIN")
                        .value_parser(clap::value_parser!(f32))
                        .help("Global volume from 0 to 100 (defaults to the config file)"),
                )
                .arg(transition_arg())
                .arg(seed_arg())
                .arg(debug_arg())
                .arg(
                    Arg::new("headless")
                        .long("headless")
                        .action(ArgAction::SetTrue)
                        .help("Use the silent mock backend instead of the audio device"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a config and report the pre-warmed pools")
                .arg(config_arg())
                .arg(
                    Arg::new("skip-files")
                        .long("skip-files")
                        .action(ArgAction::SetTrue)
                        .help("Do not verify that source files exist"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a crossfade on a manual clock and print the track volumes")
                .arg(config_arg())
                .arg(
                    Arg::new("track")
                        .long("track")
                        .value_name("ID")
                        .required(true)
                        .help("Track to start with"),
                )
                .arg(
                    Arg::new("then")
                        .long("then")
                        .value_name("ID")
                        .help("Track to switch to after the first run"),
                )
                .arg(
                    Arg::new("ms")
                        .long("ms")
                        .value_name("MS")
                        .default_value("1000")
                        .value_parser(clap::value_parser!(u64))
                        .help("Simulated time per phase in milliseconds"),
                )
                .arg(
                    Arg::new("tick-ms")
                        .long("tick-ms")
                        .value_name("MS")
                        .default_value("16")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .help("Frame interval in milliseconds"),
                )
                .arg(transition_arg())
                .arg(seed_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("quiet")
                        .help("Print every frame as JSON"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Only print the final frame"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("config-json").about("Print a template engine configuration"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn simulate_parses_numbers() {
        let matches = build_cli()
            .try_get_matches_from([
                "cadence", "simulate", "cfg.json", "--track", "bg", "--ms", "250", "--seed", "9",
            ])
            .expect("parse");
        let (name, sub) = matches.subcommand().expect("subcommand");
        assert_eq!(name, "simulate");
        assert_eq!(sub.get_one::<u64>("ms"), Some(&250));
        assert_eq!(sub.get_one::<u64>("tick-ms"), Some(&16));
        assert_eq!(sub.get_one::<u64>("seed"), Some(&9));
        assert_eq!(sub.get_one::<String>("then"), None);
    }

    #[test]
    fn simulate_requires_a_track() {
        let result = build_cli().try_get_matches_from(["cadence", "simulate", "cfg.json"]);
        assert!(result.is_err());
    }
}
