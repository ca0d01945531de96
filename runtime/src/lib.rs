//! Execution context, configuration, and the two seams between the call
//! orchestrator and the interpreter: [`Handler`] (what running code may ask
//! of its environment) and [`Interpreter`] (what the orchestrator asks of the
//! bytecode engine).

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod config;
mod context;
mod handler;
mod interpreter;

pub use nrg_evm_core::*;

pub use crate::config::Config;
pub use crate::context::{BlockHashFn, ExecutionContext, Vicinity, BLOCK_HASH_WINDOW};
pub use crate::handler::Handler;
pub use crate::interpreter::{Execution, Frame, Interpreter};
