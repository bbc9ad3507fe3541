#![doc(test(attr(deny(warnings))))]

//! Ledger Core turns obligations — one-off purchases, multi-month installment
//! purchases, and periodic recurring rules — into concrete ledger entries,
//! and manages a credit card's monthly invoice as a closed state machine fed
//! by manual charges or by a parsed statement file.

pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod statement;
pub mod storage;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::LedgerEngine;
pub use errors::{EngineError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
