//! Coalescing of concurrent identical computations.

use core::error::Error;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::future::FutureExt;
use futures::future::Shared;
use tokio::task::JoinError;

/// Failure of a flight as a whole, reported to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum FlightError {
    #[display("Flight panicked: {message}")]
    Panicked { message: String },
    #[display("Flight was cancelled")]
    Cancelled,
}

impl Error for FlightError {}

impl From<JoinError> for FlightError {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return Self::Cancelled;
        }
        Self::Panicked {
            message: panic_message(err.into_panic().as_ref()),
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

type SharedFlight<T> = Shared<BoxFuture<'static, Result<T, FlightError>>>;

struct Flight<T: Clone> {
    id: u64,
    result: SharedFlight<T>,
}

struct Slot<T: Clone> {
    next_id: u64,
    current: Option<Flight<T>>,
}

/// Runs at most one computation at a time; callers arriving while one is in
/// flight await its result instead of starting their own.
///
/// The computation is spawned on the runtime, so it runs to completion even
/// when every caller stops waiting for it. The slot is released by the
/// computation itself when it finishes, after which the next call starts a
/// fresh one.
pub struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                next_id: 0,
                current: None,
            })),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the flight in progress, or starts `work` as a new one.
    ///
    /// `work` is dropped unpolled when a flight is already in progress.
    ///
    /// # Errors
    ///
    /// - [`FlightError::Panicked`] if the computation panicked
    /// - [`FlightError::Cancelled`] if the runtime shut down underneath it
    pub async fn run<F>(&self, work: F) -> Result<T, FlightError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let result = {
            let mut slot = self.slot.lock().expect("poisoned");
            match &slot.current {
                Some(flight) => {
                    tracing::trace!(flight = flight.id, "joining flight in progress");
                    flight.result.clone()
                }
                None => {
                    let id = slot.next_id;
                    slot.next_id += 1;

                    let release = Release {
                        slot: self.slot.clone(),
                        id,
                    };
                    // Spawned on first poll, outside the slot lock: a stopping
                    // runtime drops `release` inside `tokio::spawn`.
                    let result = async move {
                        let handle = tokio::spawn(async move {
                            let _release = release;
                            work.await
                        });
                        handle.await.map_err(FlightError::from)
                    }
                    .boxed()
                    .shared();

                    slot.current = Some(Flight {
                        id,
                        result: result.clone(),
                    });
                    result
                }
            }
        };

        result.await
    }

    /// Whether a computation is currently running.
    pub fn in_flight(&self) -> bool {
        self.slot.lock().expect("poisoned").current.is_some()
    }
}

/// Clears the slot when the spawned computation completes or unwinds.
struct Release<T: Clone> {
    slot: Arc<Mutex<Slot<T>>>,
    id: u64,
}

impl<T: Clone> Drop for Release<T> {
    fn drop(&mut self) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        if slot.current.as_ref().is_some_and(|flight| flight.id == self.id) {
            slot.current = None;
        }
    }
}
