use std::time::Duration;

use cadence_lib::{ConsentState, HostSignal};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::error;

use crate::board::{BoardStatus, Soundboard, TrackSlot};

pub struct StatusSnapshot {
    pub text: String,
}

/// Soundboard command bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Sound(usize),
    NextTrack,
    EmptyTrack,
    VolumeDown,
    VolumeUp,
    ToggleTick,
    Quit,
}

pub fn control_for(code: KeyCode) -> Option<Control> {
    match code {
        KeyCode::Char(digit @ '1'..='9') => {
            Some(Control::Sound(digit as usize - '1' as usize))
        }
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Control::NextTrack),
        KeyCode::Char('e') | KeyCode::Char('E') => Some(Control::EmptyTrack),
        KeyCode::Char('-') => Some(Control::VolumeDown),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Control::VolumeUp),
        KeyCode::Char(' ') => Some(Control::ToggleTick),
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::Quit),
        _ => None,
    }
}

pub fn status_text(status: &BoardStatus, sound_ids: &[String]) -> StatusSnapshot {
    let consent = match status.consent {
        ConsentState::Granted => "granted",
        ConsentState::Pending => "pending (press any key)",
    };
    let mut text = format!(
        "Volume: {:>3.0}%   Consent: {}   {}   Tick: {}\nTrack: {}   Fading out: {}",
        status.volume * 100.0,
        consent,
        if status.visible { "visible" } else { "hidden" },
        if status.ticking { "running" } else { "stopped" },
        slot_text(status.current.as_ref()),
        slot_text(status.previous.as_ref()),
    );
    for (index, row) in status.pools.iter().enumerate() {
        let key = if index < 9 && index < sound_ids.len() {
            format!("{}", index + 1)
        } else {
            "-".to_string()
        };
        text.push_str(&format!(
            "\n[{}] {:<16} active {:>2}  idle {:>2}",
            key, row.type_id, row.active, row.idle
        ));
    }

    StatusSnapshot { text }
}

fn slot_text(slot: Option<&TrackSlot>) -> String {
    match slot {
        Some(slot) => format!(
            "{} ({:.2}) {:.1}s",
            slot.type_id,
            slot.volume,
            slot.position_ms / 1000.0
        ),
        None => "-".to_string(),
    }
}

/// Wait up to `timeout` for input and apply it. Returns `false` once the user quits.
pub fn handle_input(board: &mut Soundboard, timeout: Duration) -> bool {
    if !event::poll(timeout).unwrap_or(false) {
        return true;
    }
    let key = match event::read() {
        Ok(Event::Key(key)) => key,
        Ok(Event::FocusLost) => {
            board.host_signal(HostSignal::VisibilityChanged { visible: false });
            return true;
        }
        Ok(Event::FocusGained) => {
            board.host_signal(HostSignal::VisibilityChanged { visible: true });
            return true;
        }
        _ => return true,
    };
    if key.kind != KeyEventKind::Press {
        return true;
    }

    board.host_signal(HostSignal::UserInteraction);

    let result = match control_for(key.code) {
        Some(Control::Quit) => return false,
        Some(Control::Sound(index)) => board.trigger(index).map(|_| ()),
        Some(Control::NextTrack) => board.next_track(),
        Some(Control::EmptyTrack) => {
            board.play_empty();
            Ok(())
        }
        Some(Control::VolumeDown) => {
            board.nudge_volume(-1);
            Ok(())
        }
        Some(Control::VolumeUp) => {
            board.nudge_volume(1);
            Ok(())
        }
        Some(Control::ToggleTick) => {
            board.toggle_tick();
            Ok(())
        }
        None => Ok(()),
    };
    if let Err(err) = result {
        error!("{}", err);
    }

    true
}
