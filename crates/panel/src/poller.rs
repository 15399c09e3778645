//! Fetch bookkeeping for the market data poller.
//!
//! Expiry, chain and quote fetches are fenced by generation tickets so a
//! slow response for an old selection never overwrites a newer one. The
//! position book is polled on a timer; each enable/disable bumps an epoch
//! and responses from an older epoch are dropped.

use oneclick_core::error::ApiError;
use oneclick_core::instruments::OptionType;
use oneclick_core::types::PositionBook;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::event::{FetchKind, FetchTicket};

// =============================================================================
// Tickets
// =============================================================================

/// Latest generation issued per fetch kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tickets {
    expiries: u64,
    chain: u64,
    ce_quote: u64,
    pe_quote: u64,
}

impl Tickets {
    fn slot(&mut self, kind: FetchKind) -> &mut u64 {
        match kind {
            FetchKind::Expiries => &mut self.expiries,
            FetchKind::Chain => &mut self.chain,
            FetchKind::Quote(OptionType::Call) => &mut self.ce_quote,
            FetchKind::Quote(OptionType::Put) => &mut self.pe_quote,
        }
    }

    /// Issues a new ticket, superseding every earlier one of the same kind.
    pub fn issue(&mut self, kind: FetchKind) -> FetchTicket {
        let slot = self.slot(kind);
        *slot += 1;
        FetchTicket {
            kind,
            generation: *slot,
        }
    }

    #[must_use]
    pub fn latest(&self, kind: FetchKind) -> u64 {
        match kind {
            FetchKind::Expiries => self.expiries,
            FetchKind::Chain => self.chain,
            FetchKind::Quote(OptionType::Call) => self.ce_quote,
            FetchKind::Quote(OptionType::Put) => self.pe_quote,
        }
    }

    /// Returns true if `ticket` is the most recent one of its kind.
    #[must_use]
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest(ticket.kind) == ticket.generation
    }
}

// =============================================================================
// Position polling
// =============================================================================

/// Auto-refresh state for the position book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionPoller {
    enabled: bool,
    epoch: u64,
    book: PositionBook,
}

impl PositionPoller {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    #[must_use]
    pub fn total_mtm(&self) -> Decimal {
        self.book.total_mtm()
    }

    /// Enables or disables polling. Returns the new epoch if the state
    /// changed.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<u64> {
        if enabled == self.enabled {
            return None;
        }
        self.enabled = enabled;
        self.epoch += 1;
        Some(self.epoch)
    }

    /// Applies a position response. Any failure (transport, non-JSON,
    /// non-success status, malformed body) leaves an empty book.
    pub fn apply(&mut self, epoch: u64, result: Result<PositionBook, ApiError>) -> bool {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "dropping position response from old polling epoch");
            return false;
        }

        match result {
            Ok(book) => {
                debug!(positions = book.len(), total_mtm = %book.total_mtm(), "position book refreshed");
                self.book = book;
            }
            Err(e) if e.is_unauthenticated() => {
                warn!(error = %e, "position book unavailable, session may not be authenticated");
                self.book = PositionBook::default();
            }
            Err(e) => {
                warn!(error = %e, "position fetch failed");
                self.book = PositionBook::default();
            }
        }
        true
    }
}
