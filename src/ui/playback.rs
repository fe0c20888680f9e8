//! Blocking playback steered from the keyboard.

use crate::recording::PlaybackControl;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What a key press does while audio plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKey {
    TogglePause,
    Stop,
}

/// Space pauses and resumes; any other key press stops.
pub fn playback_key(key: &KeyEvent) -> Option<PlaybackKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(PlaybackKey::TogglePause),
        _ => Some(PlaybackKey::Stop),
    }
}

/// Runs `play` on this thread while another thread watches the keyboard.
///
/// `play` receives a [`PlaybackControl`] that the watcher pauses, resumes or
/// stops according to [`playback_key`]. Raising `interrupt` also stops it.
/// Requires raw mode so keys arrive without Enter.
pub fn play_until_key<R>(
    interrupt: &AtomicBool,
    play: impl FnOnce(&PlaybackControl) -> R,
) -> R {
    let control = PlaybackControl::new();
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                if interrupt.load(Ordering::Acquire) {
                    control.stop();
                    break;
                }
                match event::poll(Duration::from_millis(50)) {
                    Ok(true) => {
                        let Ok(Event::Key(key)) = event::read() else {
                            continue;
                        };
                        match playback_key(&key) {
                            Some(PlaybackKey::TogglePause) => {
                                let paused = control.toggle_pause();
                                tracing::debug!("Playback paused: {}", paused);
                            }
                            Some(PlaybackKey::Stop) => {
                                tracing::debug!("Key pressed: stopping playback");
                                control.stop();
                                break;
                            }
                            None => {}
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Keyboard polling failed during playback: {}", e);
                        break;
                    }
                }
            }
        });

        let result = play(&control);
        done.store(true, Ordering::Release);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_space_toggles_pause() {
        let key = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(playback_key(&key), Some(PlaybackKey::TogglePause));
    }

    #[test]
    fn test_other_keys_stop() {
        for code in [KeyCode::Enter, KeyCode::Esc, KeyCode::Char('q')] {
            let key = KeyEvent::new(code, KeyModifiers::NONE);
            assert_eq!(playback_key(&key), Some(PlaybackKey::Stop));
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(playback_key(&ctrl_c), Some(PlaybackKey::Stop));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let key = KeyEvent::new_with_kind(
            KeyCode::Char(' '),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(playback_key(&key), None);
    }
}
