use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::controls::air_drum::Axis;
use crate::shared::{ControlEvent, Direction, Drum};
use super::mode::TuiState;

const TEMPO_STEP: i32 = 5;

// poll the terminal for keys and resolve them into control events; the arrow
// keys don't produce events, they drive the held direction the poller reads
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<ControlEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(key.code, key.kind, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, kind: KeyEventKind, ts: &mut TuiState) -> Vec<ControlEvent> {
    match (code, kind) {
        // only terminals with enhanced keyboard reporting send releases
        (KeyCode::Up | KeyCode::Down, KeyEventKind::Release) => {
            ts.direction.release();
            vec![]
        }
        (_, KeyEventKind::Release) => vec![],

        // joystick: held while pressed or auto-repeating
        (KeyCode::Up, _) => {
            ts.direction.press(Direction::Up);
            vec![]
        }
        (KeyCode::Down, _) => {
            ts.direction.press(Direction::Down);
            vec![]
        }

        // air-drum swings go to the poller, not straight to the mixer
        (KeyCode::Char(c @ ('x' | 'y' | 'z')), KeyEventKind::Press) => {
            let axis = match c {
                'x' => Axis::X,
                'y' => Axis::Y,
                _ => Axis::Z,
            };
            ts.accel.jolt(axis);
            vec![]
        }

        // tempo knob repeats when held
        (KeyCode::Char('['), _) => vec![ControlEvent::NudgeTempo(-TEMPO_STEP)],
        (KeyCode::Char(']'), _) => vec![ControlEvent::NudgeTempo(TEMPO_STEP)],

        // edge-triggered buttons, repeats ignored
        (_, KeyEventKind::Repeat) => vec![],
        (KeyCode::Esc | KeyCode::Char('q'), _) => vec![ControlEvent::Quit],
        (KeyCode::Char('m' | ' '), _) => vec![ControlEvent::CycleMode],
        (KeyCode::Char(c @ ('1' | '2' | '3')), _) => {
            let drum = match c {
                '1' => Drum::Kick,
                '2' => Drum::HiHat,
                _ => Drum::Snare,
            };
            ts.note_hit(drum);
            vec![ControlEvent::Trigger(drum)]
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controls::air_drum::{AccelSource, Acceleration, REST};
    use crate::controls::direction::DirectionSource;
    use crate::controls::{HeldDirection, ShakenAccel};

    fn state() -> TuiState {
        TuiState::new(Arc::new(HeldDirection::default()), Arc::new(ShakenAccel::default()))
    }

    #[test]
    fn test_buttons() {
        let mut ts = state();
        let press = KeyEventKind::Press;
        assert_eq!(handle_key(KeyCode::Char('q'), press, &mut ts), vec![ControlEvent::Quit]);
        assert_eq!(handle_key(KeyCode::Esc, press, &mut ts), vec![ControlEvent::Quit]);
        assert_eq!(handle_key(KeyCode::Char(' '), press, &mut ts), vec![ControlEvent::CycleMode]);
        assert_eq!(
            handle_key(KeyCode::Char('2'), press, &mut ts),
            vec![ControlEvent::Trigger(Drum::HiHat)]
        );
        assert_eq!(ts.flashing(), Some(Drum::HiHat));
        assert_eq!(
            handle_key(KeyCode::Char(']'), KeyEventKind::Repeat, &mut ts),
            vec![ControlEvent::NudgeTempo(5)]
        );
        assert!(handle_key(KeyCode::Char('m'), KeyEventKind::Repeat, &mut ts).is_empty());
        assert!(handle_key(KeyCode::Char('k'), press, &mut ts).is_empty());
    }

    #[test]
    fn test_arrows_drive_direction() {
        let mut ts = state();
        assert!(handle_key(KeyCode::Up, KeyEventKind::Press, &mut ts).is_empty());
        assert_eq!(ts.direction.direction(), Direction::Up);
        handle_key(KeyCode::Down, KeyEventKind::Repeat, &mut ts);
        assert_eq!(ts.direction.direction(), Direction::Down);
        handle_key(KeyCode::Down, KeyEventKind::Release, &mut ts);
        assert_eq!(ts.direction.direction(), Direction::Center);
    }

    #[test]
    fn test_axis_keys_shake_accel() {
        let mut ts = state();
        assert!(handle_key(KeyCode::Char('z'), KeyEventKind::Press, &mut ts).is_empty());
        assert!(handle_key(KeyCode::Char('y'), KeyEventKind::Repeat, &mut ts).is_empty());
        let shaken = ts.accel.read();
        assert_eq!((shaken.x, shaken.y), (REST, REST));
        assert!(shaken.z > REST);

        handle_key(KeyCode::Char('z'), KeyEventKind::Press, &mut ts);
        assert_eq!(ts.accel.read(), Acceleration::AT_REST);
    }
}
