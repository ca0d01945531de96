//! Core types shared between the nrg-evm orchestrator, its runtime seams and
//! the interpreter: exit reasons, call frames and call outcomes.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod context;
mod error;
mod outcome;

pub use crate::context::{CallScheme, Context, CreateScheme, Log, NrgBudget, StructLog, Transfer};
pub use crate::error::{CallError, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed};
pub use crate::outcome::{CallOutcome, CreateOutcome};
