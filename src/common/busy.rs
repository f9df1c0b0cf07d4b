// src/common/busy.rs

use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::error::AppError;

/// Uma ação mutável por vez. A interface lê `is_busy()` para desabilitar o botão.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn try_acquire(&self) -> Result<BusyGuard<'_>, AppError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::RequestInFlight)?;
        Ok(BusyGuard(&self.0))
    }
}

// Libera a flag no Drop, inclusive quando a requisição falha.
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
