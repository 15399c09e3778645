//! One-click index options panel.
//!
//! [`PanelState`] is a pure state machine covering instrument selection,
//! market data fetch bookkeeping and order dispatch. [`PanelRuntime`] runs
//! the effects it emits against any [`oneclick_core::TradingApi`].

pub mod activity;
pub mod dispatcher;
pub mod event;
pub mod paper;
pub mod poller;
pub mod runtime;
pub mod selection;
pub mod state;

pub use activity::{Activity, ActivityLevel, ActivityLog};
pub use dispatcher::{BlockReason, Dispatch, Dispatcher, Intent, Toggles};
pub use event::{Effect, FetchKind, FetchTicket, Key, PanelEvent};
pub use paper::simulate_fill;
pub use poller::{PositionPoller, Tickets};
pub use runtime::PanelRuntime;
pub use selection::{atm_index, atm_strike, cycle, MarketView, Selection};
pub use state::PanelState;
