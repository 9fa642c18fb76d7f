//! Автоматический выключатель (Circuit Breaker) перед внешним API кинотеатра.
//!
//! Выключатель не делает повторных попыток: он только перестаёт пропускать
//! запросы к провайдеру, пока тот не восстановится. Ошибки самих запросов
//! пробрасываются вызывающему коду без изменений.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

/// Состояния выключателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// **Closed**: нормальный режим, запросы разрешены.
    Closed,
    /// **Open**: после серии сбоев запросы временно запрещены.
    Open,
    /// **HalfOpen**: таймаут истёк, пропускаем пробный запрос.
    HalfOpen,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    /// Счетчик последовательных сбоев.
    failure_count: AtomicU32,
    /// Момент перехода в Open.
    opened_at: Mutex<Option<Instant>>,
    failure_threshold: u32,
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout_seconds: u64) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: Duration::from_secs(timeout_seconds),
        }
    }

    /// Проверяет, можно ли выполнить следующий запрос.
    pub fn can_execute(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = *self.opened_at.lock().unwrap_or_else(PoisonError::into_inner);
                let expired = opened_at.map_or(true, |at| at.elapsed() >= self.timeout_duration);
                if expired {
                    self.set_state(CircuitState::HalfOpen);
                    info!("Circuit breaker transitioning to HalfOpen state");
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if self.state() == CircuitState::HalfOpen {
            self.set_state(CircuitState::Closed);
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
    }

    pub fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;

        match self.state() {
            CircuitState::Closed if failure_count >= self.failure_threshold => {
                self.open();
                error!(
                    "Circuit breaker OPENED - {} failures reached threshold {}",
                    failure_count, self.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                self.open();
                warn!("Circuit breaker test failed - returning to Open state");
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }

    fn open(&self) {
        *self.opened_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        self.set_state(CircuitState::Open);
    }

    fn set_state(&self, state: CircuitState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
