//! A one-shot `{Idle -> Running -> Stopped}` state machine.
//!
//! Observing "running" as a single boolean is racy across concurrent
//! `start`/`stop` calls; this gate gives a monotone, testable history and a
//! safe idempotent `stop` instead.

use std::sync::Mutex;

use crate::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Idle,
    Running,
    Stopped,
}

pub(crate) struct LifecycleGate {
    state: Mutex<State>,
}

impl LifecycleGate {
    pub(crate) fn new() -> Self {
        LifecycleGate {
            state: Mutex::new(State::Idle),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        *self.state.lock().unwrap() == State::Running
    }

    /// Transitions `Idle -> Running`, running `init` first. Only the caller
    /// that performs the transition runs `init`; every other caller
    /// observes the resulting state through its returned error.
    pub(crate) fn start(&self, init: impl FnOnce()) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Idle => {
                init();
                *state = State::Running;
                Ok(())
            }
            State::Running => Err(Error::AlreadyStarted),
            State::Stopped => Err(Error::AlreadyStopped),
        }
    }

    /// Transitions `Running -> Stopped`, running `finalize` first. Calling
    /// `stop` before `start`, or more than once, fails without running
    /// `finalize` again.
    pub(crate) fn stop(&self, finalize: impl FnOnce() -> Result<(), Error>) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Running => {
                let result = finalize();
                *state = State::Stopped;
                result
            }
            State::Idle => Err(Error::NotStarted),
            State::Stopped => Err(Error::AlreadyStopped),
        }
    }
}
