use crate::config::types::{Result, SequencerError};
use log::info;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
/// Async-safe interrupt latch
///
/// SIGINT/SIGTERM/SIGHUP are recorded instead of killing the runner, so the
/// current child finishes (it receives terminal signals itself) and the
/// artifact is still deleted. Handlers installed here are reset to the default
/// disposition across exec, so children are unaffected.
use std::os::raw::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

/// Last signal received, 0 when none (async-safe atomic)
static SIGNAL_RECEIVED: AtomicI32 = AtomicI32::new(0);

/// Only performs an atomic store: no allocations, no locks, no I/O
pub(crate) extern "C" fn latch(signal: c_int) {
    SIGNAL_RECEIVED.store(signal, Ordering::SeqCst);
}

/// Install the latch for SIGINT, SIGTERM and SIGHUP.
/// Must be called early in main() before any children are spawned.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(latch),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: the handler only touches an atomic.
        unsafe { signal::sigaction(sig, &action) }.map_err(std::io::Error::from)?;
    }

    info!("Signal latch installed (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Signal received since the last reset, if any
pub fn pending() -> Option<i32> {
    match SIGNAL_RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        sig => Some(sig),
    }
}

/// Fail with `Interrupted` when a signal has been latched
pub fn check() -> Result<()> {
    match pending() {
        Some(sig) => Err(SequencerError::Interrupted(sig)),
        None => Ok(()),
    }
}

pub fn reset() {
    SIGNAL_RECEIVED.store(0, Ordering::SeqCst);
}

/// Serializes tests that touch the process-wide latch
#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_records_and_resets() {
        let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset();
        assert!(check().is_ok());

        latch(Signal::SIGTERM as c_int);
        assert_eq!(pending(), Some(15));
        assert!(matches!(check(), Err(SequencerError::Interrupted(15))));

        reset();
        assert_eq!(pending(), None);
    }
}
