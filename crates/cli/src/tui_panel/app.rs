use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use oneclick_core::{Action, Exchange, OptionType, LOT_CHOICES};
use oneclick_panel::{cycle, Key, PanelEvent, PanelState};

/// Selection field that `[` and `]` step through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Exchange,
    Symbol,
    Expiry,
    CeStrike,
    PeStrike,
    Lots,
    Product,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Exchange,
        Field::Symbol,
        Field::Expiry,
        Field::CeStrike,
        Field::PeStrike,
        Field::Lots,
        Field::Product,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Exchange => "Exchange",
            Self::Symbol => "Symbol",
            Self::Expiry => "Expiry",
            Self::CeStrike => "CE Strike",
            Self::PeStrike => "PE Strike",
            Self::Lots => "Lots",
            Self::Product => "Product",
        }
    }

    fn step(self, forward: bool) -> Self {
        cycle(&Self::ALL, Some(&self), forward).unwrap_or(self)
    }
}

/// What a key press asks the front end to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Focus { forward: bool },
    Cycle { forward: bool },
    ToggleArmed,
    TogglePaper,
    ToggleAutoRefresh,
    Click(Action, OptionType),
    PanicButton,
    Hotkey(Key),
}

/// Terminal front-end state: which field has focus, and whether to exit.
#[derive(Debug)]
pub struct App {
    pub focus: Field,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            focus: Field::Symbol,
            should_quit: false,
        }
    }
}

impl App {
    /// Maps a terminal key event. Releases are ignored; presses and
    /// auto-repeats both count.
    pub fn command_for(key: &KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        Some(match key.code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Tab => Command::Focus { forward: true },
            KeyCode::BackTab => Command::Focus { forward: false },
            KeyCode::Char(']') => Command::Cycle { forward: true },
            KeyCode::Char('[') => Command::Cycle { forward: false },
            KeyCode::Char('h') => Command::ToggleArmed,
            KeyCode::Char('p') => Command::TogglePaper,
            KeyCode::Char('a') => Command::ToggleAutoRefresh,
            KeyCode::F(1) => Command::Click(Action::Buy, OptionType::Call),
            KeyCode::F(2) => Command::Click(Action::Sell, OptionType::Call),
            KeyCode::F(3) => Command::Click(Action::Buy, OptionType::Put),
            KeyCode::F(4) => Command::Click(Action::Sell, OptionType::Put),
            KeyCode::F(9) => Command::PanicButton,
            KeyCode::Up => Command::Hotkey(Key::Up),
            KeyCode::Down => Command::Hotkey(Key::Down),
            KeyCode::Left => Command::Hotkey(Key::Left),
            KeyCode::Right => Command::Hotkey(Key::Right),
            KeyCode::Char('r' | 'R') => Command::Hotkey(Key::Reverse),
            KeyCode::Esc => Command::Hotkey(Key::Escape),
            _ => return None,
        })
    }

    /// Applies a command to the front end and returns the panel event it
    /// produces, if any.
    pub fn apply(&mut self, command: Command, state: &PanelState) -> Option<PanelEvent> {
        let toggles = state.toggles();
        match command {
            Command::Quit => {
                self.should_quit = true;
                None
            }
            Command::Focus { forward } => {
                self.focus = self.focus.step(forward);
                None
            }
            Command::Cycle { forward } => self.cycle_focused(state, forward),
            Command::ToggleArmed => Some(PanelEvent::SetArmed(!toggles.armed)),
            Command::TogglePaper => Some(PanelEvent::SetPaper(!toggles.paper)),
            Command::ToggleAutoRefresh => Some(PanelEvent::SetAutoRefresh(!toggles.auto_refresh)),
            Command::Click(action, leg) => Some(PanelEvent::PlaceOrder(action, leg)),
            Command::PanicButton => Some(PanelEvent::PanicClose),
            Command::Hotkey(key) => Some(PanelEvent::Key(key)),
        }
    }

    fn cycle_focused(&self, state: &PanelState, forward: bool) -> Option<PanelEvent> {
        let selection = state.selection();
        let view = state.view();
        match self.focus {
            Field::Exchange => cycle(&Exchange::ALL, Some(&selection.exchange), forward)
                .map(PanelEvent::SetExchange),
            Field::Symbol => cycle(selection.exchange.symbols(), Some(&selection.symbol), forward)
                .map(PanelEvent::SetSymbol),
            Field::Expiry => cycle(&view.expiries, selection.expiry.as_ref(), forward)
                .map(PanelEvent::SetExpiry),
            Field::CeStrike => cycle(&view.strikes, selection.ce_strike.as_ref(), forward)
                .map(|s| PanelEvent::SetStrike(OptionType::Call, s)),
            Field::PeStrike => cycle(&view.strikes, selection.pe_strike.as_ref(), forward)
                .map(|s| PanelEvent::SetStrike(OptionType::Put, s)),
            Field::Lots => {
                cycle(&LOT_CHOICES, Some(&selection.lots), forward).map(PanelEvent::SetLots)
            }
            Field::Product => Some(PanelEvent::SetProduct(selection.product.toggled())),
        }
    }
}
