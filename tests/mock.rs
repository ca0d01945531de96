#![allow(dead_code)]

extern crate nrg_evm;

use std::collections::BTreeMap;
use std::rc::Rc;

use nrg_evm::backend::{MemoryAccount, MemoryBackend, OverlayedBackend};
use nrg_evm::executor::StackExecutor;
use nrg_evm::{
	Config, ExecutionContext, Execution, ExitError, Frame, Handler, Interpreter, NrgBudget,
	Vicinity,
};
use primitive_types::{H160, H256, U256};

pub type MockExecutor<'a> =
	StackExecutor<'a, 'a, OverlayedBackend<MemoryBackend>, MockInterpreter, ()>;

pub type Program = Box<dyn Fn(&Frame, &mut dyn Handler) -> Execution>;

/// Interpreter running scripted programs keyed by code bytes.
#[derive(Default)]
pub struct MockInterpreter {
	programs: BTreeMap<Vec<u8>, Program>,
}

impl MockInterpreter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn program<F>(mut self, code: &[u8], program: F) -> Self
	where
		F: Fn(&Frame, &mut dyn Handler) -> Execution + 'static,
	{
		self.programs.insert(code.to_vec(), Box::new(program));
		self
	}
}

impl Interpreter for MockInterpreter {
	fn run(&self, code: Rc<Vec<u8>>, frame: &Frame, handler: &mut dyn Handler) -> Execution {
		match self.programs.get(&code[..]) {
			Some(program) => program(frame, handler),
			None => Execution::error(ExitError::InvalidCode),
		}
	}
}

/// Code bytes naming scripted program `id`.
pub fn code(id: u8) -> Vec<u8> {
	vec![0xfe, id]
}

pub fn address(n: u64) -> H160 {
	H160::from_low_u64_be(0x1000 + n)
}

pub fn slot(n: u64) -> H256 {
	H256::from_low_u64_be(n)
}

pub fn nrg(limit: u64) -> NrgBudget {
	NrgBudget::new(limit, U256::one())
}

pub fn account(balance: u64) -> MemoryAccount {
	MemoryAccount {
		balance: U256::from(balance),
		..Default::default()
	}
}

pub fn contract(balance: u64, code: Vec<u8>) -> MemoryAccount {
	MemoryAccount {
		balance: U256::from(balance),
		code,
		..Default::default()
	}
}

pub fn backend(accounts: Vec<(H160, MemoryAccount)>) -> MemoryBackend {
	MemoryBackend::new(accounts.into_iter().collect())
}

pub fn overlay(accounts: Vec<(H160, MemoryAccount)>) -> OverlayedBackend<MemoryBackend> {
	OverlayedBackend::new(backend(accounts))
}

pub fn execution_context() -> ExecutionContext {
	ExecutionContext::with_recent_hashes(
		Vicinity {
			origin: address(0),
			coinbase: H160::repeat_byte(0xcb),
			block_number: U256::from(100),
			timestamp: U256::from(1_438_269_988),
			difficulty: U256::from(17_179_869_184u64),
			nrg_limit: U256::from(5_000_000),
		},
		(1..100u64).rev().map(H256::from_low_u64_be).collect(),
	)
}

pub fn executor<'a>(
	config: &'a Config,
	interpreter: &'a MockInterpreter,
	accounts: Vec<(H160, MemoryAccount)>,
) -> MockExecutor<'a> {
	StackExecutor::new(config, overlay(accounts), execution_context(), interpreter)
}
