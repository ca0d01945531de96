use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use primitive_types::{H160, H256, U256};

use crate::{Log, StructLog};

/// Number of ancestors whose hash is reachable from the current block.
pub const BLOCK_HASH_WINDOW: u64 = 256;

/// Historical block-hash lookup supplied by the chain-data layer.
pub type BlockHashFn = Box<dyn Fn(u64) -> H256>;

/// Immutable block and transaction facts.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vicinity {
	/// Sender of the transaction.
	pub origin: H160,
	/// Beneficiary of the block.
	pub coinbase: H160,
	/// Environmental block number.
	pub block_number: U256,
	/// Environmental block timestamp.
	pub timestamp: U256,
	/// Environmental block difficulty.
	pub difficulty: U256,
	/// Environmental block nrg limit.
	pub nrg_limit: U256,
}

/// Per-transaction execution context.
///
/// Everything but the call depth and the log sequence is fixed for the
/// lifetime of the transaction. Both mutable fields are driven by the call
/// orchestrator: depth goes up on entry to a nested frame and back down on
/// return, and logs recorded by a frame that is rolled back are truncated
/// away together with its state changes. Struct logs are a trace of every
/// step the interpreter ran and are never rolled back.
pub struct ExecutionContext {
	vicinity: Vicinity,
	block_hash_of: BlockHashFn,
	depth: usize,
	logs: Vec<Log>,
	struct_logs: Vec<StructLog>,
}

impl ExecutionContext {
	pub fn new(vicinity: Vicinity, block_hash_of: BlockHashFn) -> Self {
		Self {
			vicinity,
			block_hash_of,
			depth: 0,
			logs: Vec::new(),
			struct_logs: Vec::new(),
		}
	}

	/// Context resolving block hashes from a list of recent hashes, the most
	/// recent (parent) block first.
	pub fn with_recent_hashes(vicinity: Vicinity, recent: Vec<H256>) -> Self {
		let number = vicinity.block_number;
		Self::new(
			vicinity,
			Box::new(move |height| {
				let distance = number - U256::from(height) - U256::one();
				if distance >= U256::from(recent.len()) {
					return H256::default();
				}
				recent[distance.as_usize()]
			}),
		)
	}

	pub fn vicinity(&self) -> &Vicinity {
		&self.vicinity
	}

	pub fn origin(&self) -> H160 {
		self.vicinity.origin
	}

	pub fn coinbase(&self) -> H160 {
		self.vicinity.coinbase
	}

	pub fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}

	pub fn timestamp(&self) -> U256 {
		self.vicinity.timestamp
	}

	pub fn difficulty(&self) -> U256 {
		self.vicinity.difficulty
	}

	pub fn nrg_limit(&self) -> U256 {
		self.vicinity.nrg_limit
	}

	/// Hash of an ancestor block, or the zero hash if `height` is not one of
	/// the last [`BLOCK_HASH_WINDOW`] ancestors of the current block.
	pub fn block_hash(&self, height: u64) -> H256 {
		let current = self.vicinity.block_number;
		let height = U256::from(height);
		if height >= current || current - height > U256::from(BLOCK_HASH_WINDOW) {
			return H256::default();
		}

		(self.block_hash_of)(height.low_u64())
	}

	/// Number of nested frames currently active.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Only the call orchestrator moves the depth.
	pub fn set_depth(&mut self, depth: usize) {
		self.depth = depth;
	}

	pub fn add_log(&mut self, log: Log) {
		self.logs.push(log);
	}

	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	/// Drop every log recorded after the first `len` entries.
	pub fn truncate_logs(&mut self, len: usize) {
		self.logs.truncate(len);
	}

	/// Committed logs, in the order they were emitted.
	pub fn into_logs(self) -> Vec<Log> {
		self.logs
	}

	pub fn add_struct_log(&mut self, log: StructLog) {
		self.struct_logs.push(log);
	}

	/// Step trace of every frame run so far, including rolled back ones.
	pub fn struct_logs(&self) -> &[StructLog] {
		&self.struct_logs
	}
}

impl fmt::Debug for ExecutionContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExecutionContext")
			.field("vicinity", &self.vicinity)
			.field("depth", &self.depth)
			.field("logs", &self.logs)
			.field("struct_logs", &self.struct_logs.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::vec;

	fn vicinity(number: u64) -> Vicinity {
		Vicinity {
			block_number: U256::from(number),
			..Default::default()
		}
	}

	#[test]
	fn block_hash_only_resolves_ancestors() {
		let recent = (1..=300u64).map(H256::from_low_u64_be).collect::<Vec<_>>();
		let context = ExecutionContext::with_recent_hashes(vicinity(1000), recent);

		assert_eq!(context.block_hash(999), H256::from_low_u64_be(1));
		assert_eq!(context.block_hash(998), H256::from_low_u64_be(2));
		assert_eq!(context.block_hash(744), H256::from_low_u64_be(256));
		assert_eq!(context.block_hash(743), H256::default());
		assert_eq!(context.block_hash(1000), H256::default());
		assert_eq!(context.block_hash(5000), H256::default());
	}

	#[test]
	fn block_hash_with_short_history() {
		let context = ExecutionContext::with_recent_hashes(
			vicinity(3),
			vec![H256::repeat_byte(0xbb), H256::repeat_byte(0xaa)],
		);

		assert_eq!(context.block_hash(2), H256::repeat_byte(0xbb));
		assert_eq!(context.block_hash(1), H256::repeat_byte(0xaa));
		assert_eq!(context.block_hash(0), H256::default());
	}

	#[test]
	fn block_hash_delegates_to_lookup() {
		let context = ExecutionContext::new(
			vicinity(10),
			Box::new(|height| H256::from_low_u64_be(height * 2)),
		);

		assert_eq!(context.block_hash(4), H256::from_low_u64_be(8));
		assert_eq!(context.block_hash(10), H256::default());
	}

	#[test]
	fn logs_truncate_to_boundary() {
		let mut context = ExecutionContext::new(vicinity(1), Box::new(|_| H256::default()));
		for i in 0..3u64 {
			context.add_log(Log {
				address: H160::from_low_u64_be(i),
				topics: Vec::new(),
				data: Vec::new(),
			});
		}

		context.truncate_logs(1);
		assert_eq!(context.logs().len(), 1);
		assert_eq!(context.logs()[0].address, H160::from_low_u64_be(0));
		assert_eq!(context.into_logs().len(), 1);
	}

	#[test]
	fn struct_logs_survive_log_truncation() {
		let mut context = ExecutionContext::new(vicinity(1), Box::new(|_| H256::default()));
		context.add_struct_log(StructLog {
			pc: 0,
			op: 0x55,
			nrg: 100,
			nrg_cost: 20,
			depth: 1,
			stack: vec![U256::one(), U256::zero()],
			memory: Vec::new(),
			storage: Default::default(),
			error: None,
		});

		context.truncate_logs(0);
		assert_eq!(context.struct_logs().len(), 1);
		assert_eq!(context.struct_logs()[0].op, 0x55);
	}
}
