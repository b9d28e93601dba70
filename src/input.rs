use crate::model::InputState;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Without release events, a single press stays held this long so the
/// terminal's auto-repeat delay does not stutter the first step.
const INITIAL_HOLD: Duration = Duration::from_millis(550);
/// Once auto-repeat is running, a key is released this long after its last repeat.
const REPEAT_HOLD: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Control {
    RotateLeft,
    RotateRight,
    Forward,
    Backward,
    Pick,
    Quit,
}

impl Control {
    fn held_slot(self) -> Option<usize> {
        match self {
            Control::RotateLeft => Some(0),
            Control::RotateRight => Some(1),
            Control::Forward => Some(2),
            Control::Backward => Some(3),
            Control::Pick | Control::Quit => None,
        }
    }
}

pub(crate) fn control_for(key: &KeyEvent) -> Option<Control> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(Control::Quit);
    }
    match key.code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Control::RotateLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Control::RotateRight),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Control::Forward),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Control::Backward),
        KeyCode::Char(' ') => Some(Control::Pick),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Control::Quit),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug)]
struct Hold {
    pressed: Instant,
    last_seen: Instant,
}

impl Hold {
    fn started(now: Instant) -> Self {
        Self {
            pressed: now,
            last_seen: now,
        }
    }

    /// Still held without release events: the last press or repeat is recent.
    fn alive(&self, now: Instant) -> bool {
        let grace = if self.last_seen == self.pressed {
            INITIAL_HOLD
        } else {
            REPEAT_HOLD
        };
        now.saturating_duration_since(self.last_seen) < grace
    }
}

/// Turns the terminal's key event stream into level-triggered movement flags
/// and an edge-triggered pick.
#[derive(Debug)]
pub(crate) struct KeyTracker {
    release_events: bool,
    held: [Option<Hold>; 4],
    pick_pending: bool,
    /// Space auto-repeat arrives as presses without release events.
    pick_hold: Option<Hold>,
    quit: bool,
}

impl KeyTracker {
    pub(crate) fn new(release_events: bool) -> Self {
        Self {
            release_events,
            held: [None; 4],
            pick_pending: false,
            pick_hold: None,
            quit: false,
        }
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit
    }

    pub(crate) fn handle(&mut self, key: &KeyEvent, now: Instant) {
        let Some(control) = control_for(key) else {
            return;
        };
        match (control, key.kind) {
            (Control::Quit, KeyEventKind::Press) => self.quit = true,
            (Control::Pick, KeyEventKind::Press) => self.press_pick(now),
            (Control::Pick | Control::Quit, _) => {}
            (c, KeyEventKind::Release) => {
                if let Some(slot) = c.held_slot() {
                    self.held[slot] = None;
                }
            }
            (c, _) => {
                if let Some(slot) = c.held_slot() {
                    self.held[slot] = Some(match self.held[slot] {
                        Some(h) => Hold {
                            last_seen: now,
                            ..h
                        },
                        None => Hold::started(now),
                    });
                }
            }
        }
    }

    /// One pick per physical press: without release events, presses that
    /// keep arriving inside the hold window are auto-repeat.
    fn press_pick(&mut self, now: Instant) {
        if self.release_events {
            self.pick_pending = true;
            return;
        }
        match self.pick_hold {
            Some(ref mut h) if h.alive(now) => h.last_seen = now,
            _ => {
                self.pick_hold = Some(Hold::started(now));
                self.pick_pending = true;
            }
        }
    }

    fn is_held(&mut self, slot: usize, now: Instant) -> bool {
        let Some(h) = self.held[slot] else {
            return false;
        };
        if self.release_events || h.alive(now) {
            true
        } else {
            self.held[slot] = None;
            false
        }
    }

    /// Controls for the tick starting at `now`; consumes a pending pick.
    pub(crate) fn snapshot(&mut self, now: Instant) -> InputState {
        InputState {
            rotate_left: self.is_held(0, now),
            rotate_right: self.is_held(1, now),
            forward: self.is_held(2, now),
            backward: self.is_held(3, now),
            pick: std::mem::take(&mut self.pick_pending),
        }
    }
}

/// Feeds every queued key event to the tracker without blocking.
/// Returns true when the terminal was resized.
pub(crate) fn drain_events(tracker: &mut KeyTracker) -> anyhow::Result<bool> {
    let mut resized = false;
    while event::poll(Duration::ZERO)? {
        match event::read()? {
            Event::Key(k) => tracker.handle(&k, Instant::now()),
            Event::Resize(_, _) => resized = true,
            _ => {}
        }
    }
    Ok(resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyEventKind::Press)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn arrows_and_letters_map_to_the_same_controls() {
        assert_eq!(control_for(&press(KeyCode::Left)), Some(Control::RotateLeft));
        assert_eq!(control_for(&press(KeyCode::Char('D'))), Some(Control::RotateRight));
        assert_eq!(control_for(&press(KeyCode::Char('w'))), Some(Control::Forward));
        assert_eq!(control_for(&press(KeyCode::Down)), Some(Control::Backward));
        assert_eq!(control_for(&press(KeyCode::Char(' '))), Some(Control::Pick));
        assert_eq!(control_for(&press(KeyCode::Esc)), Some(Control::Quit));
        assert_eq!(control_for(&press(KeyCode::Char('x'))), None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(control_for(&ctrl_c), Some(Control::Quit));
        let ctrl_w = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(control_for(&ctrl_w), None);
    }

    #[test]
    fn release_events_end_a_hold() {
        let t0 = Instant::now();
        let mut k = KeyTracker::new(true);
        k.handle(&press(KeyCode::Up), t0);
        assert!(k.snapshot(t0 + Duration::from_secs(5)).forward);
        k.handle(&key(KeyCode::Up, KeyEventKind::Release), t0 + ms(5100));
        assert!(!k.snapshot(t0 + ms(5100)).forward);
    }

    #[test]
    fn grace_window_covers_autorepeat_delay_then_expires() {
        let t0 = Instant::now();
        let mut k = KeyTracker::new(false);
        k.handle(&press(KeyCode::Right), t0);
        assert!(k.snapshot(t0 + ms(400)).rotate_right);

        // auto-repeat arrives; after it stops the key drops quickly
        k.handle(&press(KeyCode::Right), t0 + ms(500));
        k.handle(&press(KeyCode::Right), t0 + ms(530));
        assert!(k.snapshot(t0 + ms(600)).rotate_right);
        assert!(!k.snapshot(t0 + ms(700)).rotate_right);

        // a fresh press starts a new initial window
        k.handle(&press(KeyCode::Right), t0 + ms(1000));
        assert!(k.snapshot(t0 + ms(1300)).rotate_right);
    }

    #[test]
    fn pick_fires_once_per_press() {
        let t0 = Instant::now();
        let mut k = KeyTracker::new(true);
        k.handle(&press(KeyCode::Char(' ')), t0);
        k.handle(&key(KeyCode::Char(' '), KeyEventKind::Repeat), t0 + ms(10));
        assert!(k.snapshot(t0 + ms(20)).pick);
        assert!(!k.snapshot(t0 + ms(40)).pick);
        k.handle(&key(KeyCode::Char(' '), KeyEventKind::Release), t0 + ms(50));
        assert!(!k.snapshot(t0 + ms(60)).pick);
    }

    #[test]
    fn held_space_without_release_events_picks_once() {
        let t0 = Instant::now();
        let mut k = KeyTracker::new(false);
        k.handle(&press(KeyCode::Char(' ')), t0);
        let mut picks = u32::from(k.snapshot(t0 + ms(10)).pick);

        // auto-repeat: more presses, no releases
        for i in 0..10 {
            let at = t0 + ms(500 + 33 * i);
            k.handle(&press(KeyCode::Char(' ')), at);
            picks += u32::from(k.snapshot(at + ms(5)).pick);
        }
        assert_eq!(picks, 1);

        // after the repeats go quiet, the next press picks again
        k.handle(&press(KeyCode::Char(' ')), t0 + ms(1200));
        assert!(k.snapshot(t0 + ms(1210)).pick);
    }

    #[test]
    fn several_keys_combine_in_one_snapshot() {
        let t0 = Instant::now();
        let mut k = KeyTracker::new(true);
        k.handle(&press(KeyCode::Left), t0);
        k.handle(&press(KeyCode::Up), t0);
        k.handle(&press(KeyCode::Char(' ')), t0);
        assert_eq!(
            k.snapshot(t0),
            InputState {
                rotate_left: true,
                rotate_right: false,
                forward: true,
                backward: false,
                pick: true,
            }
        );
    }

    #[test]
    fn quit_on_press_only() {
        let mut k = KeyTracker::new(true);
        k.handle(&key(KeyCode::Char('q'), KeyEventKind::Release), Instant::now());
        assert!(!k.quit_requested());
        k.handle(&press(KeyCode::Char('q')), Instant::now());
        assert!(k.quit_requested());
    }
}
