//! Config validation without audio output.

use std::path::Path;

use cadence_lib::{
    Engine, EngineConfig, EngineOptions, MockBackend, SoundTypeConfig, StealingStrategy,
};
use log::{error, info};

use crate::error::CliError;

fn policy_name(strategy: StealingStrategy) -> &'static str {
    match strategy {
        StealingStrategy::Oldest => "oldest",
        StealingStrategy::Quietest => "quietest",
        StealingStrategy::None => "none",
    }
}

/// One report line for a registered type.
pub fn describe(engine: &Engine, config: &SoundTypeConfig) -> String {
    let max = if config.max_instances == 0 {
        "unlimited".to_string()
    } else {
        config.max_instances.to_string()
    };
    let mut line = format!(
        "  {:<16} idle={} max={} policy={} sources={}",
        config.id,
        engine.idle_count(&config.id),
        max,
        policy_name(config.stealing_strategy),
        config.sources().len()
    );
    if config.looping {
        line.push_str(" loop");
    }
    if !config.fade_in {
        line.push_str(" no-fade-in");
    }
    if !config.fade_out {
        line.push_str(" no-fade-out");
    }
    line
}

fn missing_sources(config: &EngineConfig) -> Vec<String> {
    config
        .sounds
        .iter()
        .chain(config.tracks.iter())
        .flat_map(|sound| sound.sources().iter())
        .filter(|source| !Path::new(source.as_str()).exists())
        .cloned()
        .collect()
}

/// Build both engines on the mock backend and print their pools.
///
/// Returns exit code `1` when source files are missing.
pub fn run_check(path: &str, check_files: bool) -> Result<i32, CliError> {
    let config = EngineConfig::from_path(path)?;
    let options = EngineOptions::default().without_consent();
    let sounds = Engine::new(config.sounds.clone(), MockBackend::new(), options)?;
    let tracks = Engine::new(config.tracks.clone(), MockBackend::new(), options)?;

    println!("sounds ({}):", config.sounds.len());
    for sound in &config.sounds {
        println!("{}", describe(&sounds, sound));
    }
    println!("tracks ({}):", config.tracks.len());
    for track in &config.tracks {
        println!("{}", describe(&tracks, track));
    }
    println!(
        "volume={} transition_ms={} require_consent={}",
        config.volume, config.transition_duration_ms, config.require_consent
    );

    if check_files {
        let missing = missing_sources(&config);
        for source in &missing {
            println!("missing: {}", source);
        }
        if !missing.is_empty() {
            error!("{} source file(s) not found", missing.len());
            return Ok(1);
        }
    }

    info!("{} is valid", path);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_reports_pool_and_flags() {
        let config = SoundTypeConfig::new("alarm", "alarm.wav")
            .with_max_instances(2)
            .with_stealing_strategy(StealingStrategy::None)
            .with_looping(true)
            .with_fades(true, false);
        let engine = Engine::new(
            vec![config.clone()],
            MockBackend::new(),
            EngineOptions::default(),
        )
        .expect("engine");

        let line = describe(&engine, &config);
        assert!(line.contains("alarm"));
        assert!(line.contains("idle=2 max=2 policy=none sources=1 loop no-fade-out"));
    }

    #[test]
    fn unlimited_types_report_no_idle() {
        let config = SoundTypeConfig::new("free", "free.wav");
        let engine = Engine::new(vec![config.clone()], MockBackend::new(), EngineOptions::default())
            .expect("engine");
        assert!(describe(&engine, &config).contains("idle=0 max=unlimited"));
    }

    #[test]
    fn missing_sources_are_listed() {
        let config = EngineConfig {
            sounds: vec![SoundTypeConfig::new("ghost", "/definitely/not/here.wav")],
            ..EngineConfig::default()
        };
        assert_eq!(missing_sources(&config), vec!["/definitely/not/here.wav"]);
    }
}
