use std::env;
use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use cadence_lib::{EngineConfig, SoundTypeConfig, StealingStrategy};

const SAMPLE_RATE: u32 = 44_100;
const EDGE_SECONDS: f32 = 0.01;

/// A sine tone written to `<name>.wav`.
struct Tone {
    name: &'static str,
    frequency: f32,
    seconds: f32,
    amplitude: f32,
}

const TONES: &[Tone] = &[
    Tone {
        name: "blip_low",
        frequency: 330.0,
        seconds: 0.15,
        amplitude: 0.6,
    },
    Tone {
        name: "blip_high",
        frequency: 660.0,
        seconds: 0.15,
        amplitude: 0.6,
    },
    Tone {
        name: "alarm",
        frequency: 880.0,
        seconds: 0.6,
        amplitude: 0.5,
    },
    Tone {
        name: "pad_calm",
        frequency: 220.0,
        seconds: 4.0,
        amplitude: 0.3,
    },
    Tone {
        name: "pad_storm",
        frequency: 277.18,
        seconds: 4.0,
        amplitude: 0.3,
    },
];

fn main() {
    let mut args = env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_help();
        return;
    };

    match cmd.as_str() {
        "tones" => tones_cmd(args.collect()),
        "-h" | "--help" => print_help(),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
        }
    }
}

fn tones_cmd(args: Vec<String>) {
    let mut out_dir = PathBuf::from("fixtures");

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                if let Some(path) = iter.next() {
                    out_dir = PathBuf::from(path);
                } else {
                    eprintln!("--out requires a directory");
                    return;
                }
            }
            "-h" | "--help" => {
                print_tones_help();
                return;
            }
            _ => {
                eprintln!("Unknown tones arg: {}", arg);
                print_tones_help();
                return;
            }
        }
    }

    match write_fixtures(&out_dir) {
        Ok(config_path) => println!("Wrote {}", config_path.display()),
        Err(err) => eprintln!("Failed to write fixtures to {}: {}", out_dir.display(), err),
    }
}

/// Write every tone plus a matching `cadence.json`. Returns the config path.
fn write_fixtures(out_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(out_dir)?;
    for tone in TONES {
        write_tone(&out_dir.join(format!("{}.wav", tone.name)), tone)?;
    }

    let config_path = out_dir.join("cadence.json");
    fs::write(&config_path, fixture_config().to_json_pretty()?)?;
    Ok(config_path)
}

fn write_tone(path: &Path, tone: &Tone) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in tone_samples(tone) {
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

fn tone_samples(tone: &Tone) -> Vec<f32> {
    let total = (tone.seconds * SAMPLE_RATE as f32) as usize;
    let edge = ((EDGE_SECONDS * SAMPLE_RATE as f32) as usize).min(total / 2).max(1);
    (0..total)
        .map(|index| {
            let t = index as f32 / SAMPLE_RATE as f32;
            let envelope = (index.min(total - 1 - index) as f32 / edge as f32).min(1.0);
            (TAU * tone.frequency * t).sin() * tone.amplitude * envelope
        })
        .collect()
}

fn fixture_config() -> EngineConfig {
    EngineConfig {
        sounds: vec![
            SoundTypeConfig::new(
                "blip",
                vec!["blip_low.wav".to_string(), "blip_high.wav".to_string()],
            )
            .with_max_instances(4)
            .with_randomize(0.2, 0.1),
            SoundTypeConfig::new("alarm", "alarm.wav")
                .with_max_instances(1)
                .with_stealing_strategy(StealingStrategy::None),
        ],
        tracks: vec![
            SoundTypeConfig::new("calm", "pad_calm.wav")
                .with_max_instances(1)
                .with_looping(true),
            SoundTypeConfig::new("storm", "pad_storm.wav")
                .with_max_instances(1)
                .with_looping(true),
        ],
        require_consent: false,
        ..EngineConfig::default()
    }
}

fn print_help() {
    println!(
        "cadence-scripts\n\nCommands:\n  tones    Write test-tone WAV files and a matching cadence.json\n\nRun 'cadence-scripts tones --help' for options."
    );
}

fn print_tones_help() {
    println!(
        "Usage: cadence-scripts tones [options]\n\nOptions:\n  --out <dir>    Output directory (default fixtures)\n  -h, --help     Show this help"
    );
}
