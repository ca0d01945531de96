use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

use crate::ExitError;

/// Create scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// Address derived from the caller and its current nonce.
	Legacy {
		/// Caller of the create.
		caller: H160,
	},
	/// Create at a fixed location.
	Fixed(H160),
}

/// Call scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallScheme {
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
	/// `STATICCALL`
	StaticCall,
}

impl CallScheme {
	/// Whether the scheme moves value from the caller.
	pub fn transfers_value(&self) -> bool {
		matches!(self, Self::Call | Self::CallCode)
	}
}

/// Identity a frame executes under.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
	/// Execution address. Storage reads and writes of the frame go here.
	pub address: H160,
	/// Effective sender of the frame.
	pub caller: H160,
	/// Value the frame appears to have received.
	pub apparent_value: U256,
}

impl Context {
	/// Frame of an externally owned account issuing a top-level transaction.
	pub fn external(address: H160) -> Self {
		Self {
			address,
			caller: address,
			apparent_value: U256::zero(),
		}
	}
}

/// Transfer from source to target, with given value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
	/// Source address.
	pub source: H160,
	/// Target address.
	pub target: H160,
	/// Transfer value.
	pub value: U256,
}

/// Nrg handed to a frame.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NrgBudget {
	/// Maximum nrg the frame may consume.
	pub limit: u64,
	/// Price per unit of nrg.
	pub price: U256,
}

impl NrgBudget {
	pub fn new(limit: u64, price: U256) -> Self {
		Self { limit, price }
	}

	/// Same price, different limit.
	pub fn with_limit(self, limit: u64) -> Self {
		Self { limit, ..self }
	}
}

/// Log entry emitted by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// One interpreter step, recorded for tracing.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructLog {
	/// Program counter before the step.
	pub pc: usize,
	/// Opcode executed.
	pub op: u8,
	/// Nrg left before the step.
	pub nrg: u64,
	/// Nrg charged by the step.
	pub nrg_cost: u64,
	/// Depth of the frame that executed the step.
	pub depth: usize,
	pub stack: Vec<U256>,
	pub memory: Vec<u8>,
	/// Storage slots of the running account touched so far.
	pub storage: BTreeMap<H256, H256>,
	/// Halt raised by the step, if any.
	pub error: Option<ExitError>,
}
