// File: crates/canvas-core/src/handle.rs
// Summary: Shared engine handle with explicit load states and single-flight initialization.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error};

use crate::error::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

enum LoadState<E> {
    Uninitialized,
    Loading,
    Ready(Rc<E>),
    Failed(EngineError),
}

type Waiter<E> = Box<dyn FnOnce(Result<Rc<E>, EngineError>)>;

struct Shared<E> {
    state: LoadState<E>,
    waiters: Vec<Waiter<E>>,
}

/// Cloneable reference to a graphics engine that may still be loading.
///
/// Every clone observes the same state. Only one load is ever in flight: the first
/// requester drives it through a [`LoadTicket`], later requesters are queued and
/// resolved together when the ticket completes.
pub struct EngineHandle<E> {
    inner: Rc<RefCell<Shared<E>>>,
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<E: 'static> EngineHandle<E> {
    pub fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(Shared { state: LoadState::Uninitialized, waiters: Vec::new() })) }
    }

    /// Handle to an engine that is already initialized.
    pub fn ready(engine: E) -> Self {
        let h = Self::new();
        h.inner.borrow_mut().state = LoadState::Ready(Rc::new(engine));
        h
    }

    pub fn status(&self) -> EngineStatus {
        match self.inner.borrow().state {
            LoadState::Uninitialized => EngineStatus::Uninitialized,
            LoadState::Loading => EngineStatus::Loading,
            LoadState::Ready(_) => EngineStatus::Ready,
            LoadState::Failed(_) => EngineStatus::Failed,
        }
    }

    /// The engine, when ready.
    pub fn get(&self) -> Option<Rc<E>> {
        match &self.inner.borrow().state {
            LoadState::Ready(e) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<EngineError> {
        match &self.inner.borrow().state {
            LoadState::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Ask for the engine. `waiter` runs once the engine is ready or failed (immediately if
    /// it already is). Returns a ticket only to the requester that must perform the load.
    pub fn request(&self, waiter: impl FnOnce(Result<Rc<E>, EngineError>) + 'static) -> Option<LoadTicket<E>> {
        if let Some(outcome) = self.settled() {
            waiter(outcome);
            return None;
        }
        let mut shared = self.inner.borrow_mut();
        shared.waiters.push(Box::new(waiter));
        if matches!(shared.state, LoadState::Loading) {
            return None;
        }
        shared.state = LoadState::Loading;
        debug!("engine load started");
        Some(LoadTicket { handle: self.clone(), done: false })
    }

    /// Be notified when the engine settles without starting a load. Runs immediately
    /// when the engine is already ready or failed.
    pub fn on_ready(&self, waiter: impl FnOnce(Result<Rc<E>, EngineError>) + 'static) {
        if let Some(outcome) = self.settled() {
            waiter(outcome);
            return;
        }
        self.inner.borrow_mut().waiters.push(Box::new(waiter));
    }

    /// Run `load` synchronously if nobody has started loading yet.
    pub fn load_with(&self, load: impl FnOnce() -> Result<E, EngineError>) -> Result<Rc<E>, EngineError> {
        if let Some(ticket) = self.request(|_| {}) {
            ticket.complete(load());
        }
        self.settled()
            .unwrap_or_else(|| Err(EngineError::Load("engine load already in flight".to_string())))
    }

    fn settled(&self) -> Option<Result<Rc<E>, EngineError>> {
        match &self.inner.borrow().state {
            LoadState::Ready(e) => Some(Ok(e.clone())),
            LoadState::Failed(err) => Some(Err(err.clone())),
            LoadState::Uninitialized | LoadState::Loading => None,
        }
    }

    /// Forget a failed load so the next request starts a fresh one.
    pub fn reset_failed(&self) {
        let mut shared = self.inner.borrow_mut();
        if matches!(shared.state, LoadState::Failed(_)) {
            shared.state = LoadState::Uninitialized;
        }
    }

    fn resolve(&self, result: Result<E, EngineError>) {
        let (outcome, waiters) = {
            let mut shared = self.inner.borrow_mut();
            let outcome = match result {
                Ok(engine) => {
                    let engine = Rc::new(engine);
                    shared.state = LoadState::Ready(engine.clone());
                    Ok(engine)
                }
                Err(e) => {
                    error!("engine load failed: {e}");
                    shared.state = LoadState::Failed(e.clone());
                    Err(e)
                }
            };
            (outcome, std::mem::take(&mut shared.waiters))
        };
        debug!("engine load resolved; notifying {} waiter(s)", waiters.len());
        for w in waiters {
            w(outcome.clone());
        }
    }
}

impl<E: 'static> Default for EngineHandle<E> {
    fn default() -> Self { Self::new() }
}

/// Obligation to finish the single in-flight engine load.
///
/// Dropping an uncompleted ticket fails the load so waiters are never stranded.
pub struct LoadTicket<E: 'static> {
    handle: EngineHandle<E>,
    done: bool,
}

impl<E: 'static> LoadTicket<E> {
    pub fn complete(mut self, result: Result<E, EngineError>) {
        self.done = true;
        self.handle.resolve(result);
    }
}

impl<E: 'static> Drop for LoadTicket<E> {
    fn drop(&mut self) {
        if !self.done {
            self.done = true;
            self.handle.resolve(Err(EngineError::Load("load abandoned".to_string())));
        }
    }
}
