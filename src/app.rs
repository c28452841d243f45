use crate::engine::Engine;
use crate::settings::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A user command decoded from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleDensityMode,
    ToggleDensityTier,
    Stronger,
    Weaker,
    WindLeft,
    WindRight,
    TogglePause,
    ToggleHelp,
    CycleColor,
}

impl Action {
    /// Map a key event to an action; releases and unbound keys yield `None`
    pub fn from_key(key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::ToggleDensityMode),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleDensityTier),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Stronger),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::Weaker),
            KeyCode::Left => Some(Action::WindLeft),
            KeyCode::Right => Some(Action::WindRight),
            KeyCode::Char(' ') => Some(Action::TogglePause),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::CycleColor),
            _ => None,
        }
    }
}

/// Main application state
pub struct App {
    pub engine: Engine,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            show_help: false,
            should_quit: false,
        }
    }

    /// Decode and apply a key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Esc closes the help overlay before it quits
        if self.show_help && key.code == KeyCode::Esc && key.kind == KeyEventKind::Press {
            self.show_help = false;
            return;
        }
        if let Some(action) = Action::from_key(key) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.should_quit = true;
                self.engine.stop();
            }
            Action::ToggleDensityMode => self.engine.toggle_density_mode(),
            Action::ToggleDensityTier => self.engine.toggle_density_tier(),
            Action::Stronger => self.engine.increase_strength(),
            Action::Weaker => self.engine.decrease_strength(),
            Action::WindLeft => self.engine.set_direction(Direction::Left),
            Action::WindRight => self.engine.set_direction(Direction::Right),
            Action::TogglePause => self.engine.toggle_pause(),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::CycleColor => self.engine.cycle_color(),
        }
    }
}
