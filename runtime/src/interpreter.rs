use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::H160;

use crate::{Context, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Handler, NrgBudget};

/// One contract invocation, as handed to the interpreter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
	/// Identity the code runs under.
	pub context: Context,
	/// Address the code was loaded from.
	pub code_address: H160,
	/// Call data.
	pub input: Vec<u8>,
	/// Nrg available to the frame.
	pub nrg: NrgBudget,
	/// Entered through `DELEGATECALL`.
	pub is_delegate: bool,
	/// State modifications are forbidden.
	pub is_static: bool,
	/// Depth of this frame; the top-level frame is at depth 1.
	pub depth: usize,
}

/// What the interpreter reports when a frame halts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Execution {
	pub reason: ExitReason,
	pub output: Vec<u8>,
	pub nrg_left: u64,
}

impl Execution {
	pub fn returned(output: Vec<u8>, nrg_left: u64) -> Self {
		Self {
			reason: ExitSucceed::Returned.into(),
			output,
			nrg_left,
		}
	}

	pub fn stopped(nrg_left: u64) -> Self {
		Self {
			reason: ExitSucceed::Stopped.into(),
			output: Vec::new(),
			nrg_left,
		}
	}

	pub fn reverted(output: Vec<u8>, nrg_left: u64) -> Self {
		Self {
			reason: ExitRevert::Reverted.into(),
			output,
			nrg_left,
		}
	}

	/// Exceptional halt; the frame's nrg is gone.
	pub fn error(error: ExitError) -> Self {
		Self {
			reason: error.into(),
			output: Vec::new(),
			nrg_left: 0,
		}
	}

	pub fn fatal(fatal: ExitFatal) -> Self {
		Self {
			reason: fatal.into(),
			output: Vec::new(),
			nrg_left: 0,
		}
	}
}

/// Bytecode engine. Runs a single frame to completion, re-entering the
/// orchestrator through `handler` for nested calls and creations.
#[auto_impl::auto_impl(&, Box)]
pub trait Interpreter {
	fn run(&self, code: Rc<Vec<u8>>, frame: &Frame, handler: &mut dyn Handler) -> Execution;
}
