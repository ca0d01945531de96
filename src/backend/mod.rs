//! # Database adapters
//!
//! Two layers sit under the orchestrator. A [`Backend`] is the persistent,
//! read-only account state of the chain (the trie lives behind it). A
//! [`Database`] is the transactional view the orchestrator mutates: it adds
//! writes and cheap snapshots on top of a backend.

mod memory;
mod overlayed;

pub use self::memory::{MemoryAccount, MemoryBackend};
pub use self::overlayed::{ChangeSet, OverlayedBackend};

use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::{CallError, ExitError, ExitFatal, Transfer};

/// Basic account information.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Basic {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: u64,
}

/// Persistent account state.
#[auto_impl::auto_impl(&, Box)]
pub trait Backend {
	/// Get basic account information.
	fn basic(&self, address: H160) -> Basic;
	/// Get account code.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get account code hash.
	fn code_hash(&self, address: H160) -> H256 {
		H256::from_slice(Keccak256::digest(self.code(address)).as_slice())
	}
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Whether account at address exists.
	fn exists(&self, address: H160) -> bool;
}

/// Backend that can persist the changes of a finished transaction.
pub trait ApplyBackend {
	/// Apply given values and logs at backend.
	fn apply(&mut self, changes: ChangeSet);
}

/// Handle to a point-in-time view of a [`Database`].
///
/// A handle is consumed by [`Database::restore_to`] or [`Database::commit`].
/// Restoring or committing a handle invalidates every handle taken after it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct Snapshot {
	id: u64,
	depth: usize,
}

impl Snapshot {
	pub fn new(id: u64, depth: usize) -> Self {
		Self { id, depth }
	}

	/// Monotonic identifier, unique within one database.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Number of snapshots open once this one was taken.
	pub fn depth(&self) -> usize {
		self.depth
	}
}

/// Transactional account state, as driven by the call orchestrator.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Database {
	fn balance(&self, address: H160) -> U256;
	fn set_balance(&mut self, address: H160, balance: U256);
	fn nonce(&self, address: H160) -> u64;
	fn set_nonce(&mut self, address: H160, nonce: u64);
	fn code(&self, address: H160) -> Vec<u8>;
	fn code_hash(&self, address: H160) -> H256;
	fn set_code(&mut self, address: H160, code: Vec<u8>);
	fn storage(&self, address: H160, index: H256) -> H256;
	fn set_storage(&mut self, address: H160, index: H256, value: H256);
	fn exists(&self, address: H160) -> bool;

	/// Take a snapshot of the current state.
	fn snapshot(&mut self) -> Snapshot;
	/// Discard every change made since `snapshot` was taken.
	fn restore_to(&mut self, snapshot: Snapshot) -> Result<(), ExitFatal>;
	/// Keep every change made since `snapshot` was taken and release it.
	fn commit(&mut self, snapshot: Snapshot) -> Result<(), ExitFatal>;

	/// Bump the nonce of address by one.
	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError> {
		let nonce = self.nonce(address);
		if nonce == u64::MAX {
			return Err(ExitError::MaxNonce);
		}
		self.set_nonce(address, nonce + 1);
		Ok(())
	}

	/// Move value between accounts. The debit never takes a balance below
	/// zero; a credit that would overflow is fatal.
	fn transfer(&mut self, transfer: &Transfer) -> Result<(), CallError> {
		let source = self.balance(transfer.source);
		if source < transfer.value {
			return Err(ExitError::InsufficientBalance.into());
		}
		self.set_balance(transfer.source, source - transfer.value);

		let target = self
			.balance(transfer.target)
			.checked_add(transfer.value)
			.ok_or(ExitFatal::BalanceOverflow)?;
		self.set_balance(transfer.target, target);

		log::trace!(
			target: "evm",
			"Transferred {} from {:?} to {:?}",
			transfer.value,
			transfer.source,
			transfer.target,
		);

		Ok(())
	}
}
