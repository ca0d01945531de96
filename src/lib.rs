//! Execution environment and message-call orchestration for an nrg-metered
//! Ethereum-style virtual machine.
//!
//! The crate sits between a bytecode interpreter and the account database:
//! [`executor::StackExecutor`] implements `CALL`, `CALLCODE`, `DELEGATECALL`,
//! `STATICCALL` and `CREATE` on top of a snapshotting [`backend::Database`],
//! and is the [`Handler`] the interpreter re-enters for nested frames.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub use nrg_evm_core::*;
pub use nrg_evm_runtime::*;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {{
		use crate::tracing::Event::*;
		$x.emit();
	}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

pub mod backend;
pub mod executor;

pub use crate::executor::create_address;
