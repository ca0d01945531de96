use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};
use core::mem;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use super::{Backend, Database, Snapshot};
use crate::ExitFatal;

/// Committed changes of a transaction, ready to be applied to a backend.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeSet {
	pub balances: BTreeMap<H160, U256>,
	pub nonces: BTreeMap<H160, u64>,
	pub codes: BTreeMap<H160, Vec<u8>>,
	pub storages: BTreeMap<(H160, H256), H256>,
}

#[derive(Clone, Copy)]
enum MergeStrategy {
	Commit,
	Revert,
}

/// Copy-on-write overlay on top of a [`Backend`].
///
/// Every snapshot pushes an empty substate; writes land in the topmost
/// substate and reads walk down the substate chain before falling back to
/// the backend. Restoring drops substates, committing folds them into their
/// parent.
pub struct OverlayedBackend<B> {
	backend: B,
	substate: Box<Substate>,
	snapshots: Vec<u64>,
	next_snapshot: u64,
}

impl<B> OverlayedBackend<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			substate: Box::new(Substate::new()),
			snapshots: Vec::new(),
			next_snapshot: 0,
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Number of snapshots currently open.
	pub fn open_snapshots(&self) -> usize {
		self.snapshots.len()
	}

	/// All pending changes, flattened across open snapshots.
	pub fn changes(&self) -> ChangeSet {
		let mut layers = Vec::new();
		let mut current = Some(&*self.substate);
		while let Some(substate) = current {
			layers.push(substate);
			current = substate.parent.as_deref();
		}

		let mut changes = ChangeSet::default();
		for substate in layers.into_iter().rev() {
			changes.balances.extend(substate.balances.iter().map(|(k, v)| (*k, *v)));
			changes.nonces.extend(substate.nonces.iter().map(|(k, v)| (*k, *v)));
			changes.codes.extend(substate.codes.iter().map(|(k, v)| (*k, v.clone())));
			changes.storages.extend(substate.storages.iter().map(|(k, v)| (*k, *v)));
		}
		changes
	}

	/// Release the backend together with the committed changes. Snapshots
	/// still open are committed.
	pub fn deconstruct(mut self) -> (B, ChangeSet) {
		if !self.snapshots.is_empty() {
			log::warn!(
				target: "evm",
				"Deconstructing overlay with {} open snapshots",
				self.snapshots.len()
			);
			while self.substate.parent.is_some() {
				self.pop_substate(MergeStrategy::Commit);
			}
		}

		let substate = *self.substate;
		(
			self.backend,
			ChangeSet {
				balances: substate.balances,
				nonces: substate.nonces,
				codes: substate.codes,
				storages: substate.storages,
			},
		)
	}

	fn push_substate(&mut self) {
		let mut parent = Box::new(Substate::new());
		mem::swap(&mut parent, &mut self.substate);
		self.substate.parent = Some(parent);
	}

	fn pop_substate(&mut self, strategy: MergeStrategy) {
		let mut child = match self.substate.parent.take() {
			Some(parent) => parent,
			None => return,
		};
		mem::swap(&mut child, &mut self.substate);

		match strategy {
			MergeStrategy::Commit => {
				self.substate.balances.append(&mut child.balances);
				self.substate.nonces.append(&mut child.nonces);
				self.substate.codes.append(&mut child.codes);
				self.substate.storages.append(&mut child.storages);
			}
			MergeStrategy::Revert => (),
		}
	}

	/// Close every snapshot from `snapshot` upwards.
	fn close(&mut self, snapshot: Snapshot, strategy: MergeStrategy) -> Result<(), ExitFatal> {
		let index = snapshot
			.depth()
			.checked_sub(1)
			.ok_or(ExitFatal::UnevenSnapshot)?;
		if self.snapshots.get(index) != Some(&snapshot.id()) {
			return Err(ExitFatal::UnevenSnapshot);
		}

		while self.snapshots.len() > index {
			self.snapshots.pop();
			self.pop_substate(strategy);
		}

		Ok(())
	}
}

impl<B: Backend> Database for OverlayedBackend<B> {
	fn balance(&self, address: H160) -> U256 {
		self.substate
			.known_balance(address)
			.unwrap_or_else(|| self.backend.basic(address).balance)
	}

	fn set_balance(&mut self, address: H160, balance: U256) {
		self.substate.balances.insert(address, balance);
	}

	fn nonce(&self, address: H160) -> u64 {
		self.substate
			.known_nonce(address)
			.unwrap_or_else(|| self.backend.basic(address).nonce)
	}

	fn set_nonce(&mut self, address: H160, nonce: u64) {
		self.substate.nonces.insert(address, nonce);
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.substate
			.known_code(address)
			.unwrap_or_else(|| self.backend.code(address))
	}

	fn code_hash(&self, address: H160) -> H256 {
		match self.substate.known_code(address) {
			Some(code) => H256::from_slice(Keccak256::digest(code).as_slice()),
			None => self.backend.code_hash(address),
		}
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		self.substate.codes.insert(address, code);
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.substate
			.known_storage(address, index)
			.unwrap_or_else(|| self.backend.storage(address, index))
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		self.substate.storages.insert((address, index), value);
	}

	fn exists(&self, address: H160) -> bool {
		self.substate.known_exists(address) || self.backend.exists(address)
	}

	fn snapshot(&mut self) -> Snapshot {
		let id = self.next_snapshot;
		self.next_snapshot += 1;

		self.push_substate();
		self.snapshots.push(id);

		log::trace!(target: "evm", "Snapshot {} taken at depth {}", id, self.snapshots.len());
		Snapshot::new(id, self.snapshots.len())
	}

	fn restore_to(&mut self, snapshot: Snapshot) -> Result<(), ExitFatal> {
		log::trace!(target: "evm", "Restoring snapshot {}", snapshot.id());
		self.close(snapshot, MergeStrategy::Revert)
	}

	fn commit(&mut self, snapshot: Snapshot) -> Result<(), ExitFatal> {
		log::trace!(target: "evm", "Committing snapshot {}", snapshot.id());
		self.close(snapshot, MergeStrategy::Commit)
	}
}

struct Substate {
	parent: Option<Box<Substate>>,
	balances: BTreeMap<H160, U256>,
	nonces: BTreeMap<H160, u64>,
	codes: BTreeMap<H160, Vec<u8>>,
	storages: BTreeMap<(H160, H256), H256>,
}

impl Substate {
	pub fn new() -> Self {
		Self {
			parent: None,
			balances: Default::default(),
			nonces: Default::default(),
			codes: Default::default(),
			storages: Default::default(),
		}
	}

	pub fn known_balance(&self, address: H160) -> Option<U256> {
		if let Some(balance) = self.balances.get(&address) {
			Some(*balance)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_balance(address)
		} else {
			None
		}
	}

	pub fn known_nonce(&self, address: H160) -> Option<u64> {
		if let Some(nonce) = self.nonces.get(&address) {
			Some(*nonce)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_nonce(address)
		} else {
			None
		}
	}

	pub fn known_code(&self, address: H160) -> Option<Vec<u8>> {
		if let Some(code) = self.codes.get(&address) {
			Some(code.clone())
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_code(address)
		} else {
			None
		}
	}

	pub fn known_storage(&self, address: H160, key: H256) -> Option<H256> {
		if let Some(value) = self.storages.get(&(address, key)) {
			Some(*value)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_storage(address, key)
		} else {
			None
		}
	}

	pub fn known_exists(&self, address: H160) -> bool {
		if self.balances.contains_key(&address)
			|| self.nonces.contains_key(&address)
			|| self.codes.contains_key(&address)
		{
			true
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_exists(address)
		} else {
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{MemoryAccount, MemoryBackend};

	const ALICE: H160 = H160([0xaa; 20]);
	const BOB: H160 = H160([0xbb; 20]);

	fn overlay() -> OverlayedBackend<MemoryBackend> {
		OverlayedBackend::new(MemoryBackend::new(BTreeMap::from([(
			ALICE,
			MemoryAccount {
				balance: U256::from(100),
				nonce: 5,
				..Default::default()
			},
		)])))
	}

	#[test]
	fn restore_discards_writes() {
		let mut db = overlay();
		let before = db.changes();

		let snapshot = db.snapshot();
		db.set_balance(ALICE, U256::from(1));
		db.set_nonce(ALICE, 6);
		db.set_code(BOB, vec![0x60, 0x00]);
		db.set_storage(BOB, H256::zero(), H256::repeat_byte(1));
		assert!(db.exists(BOB));

		db.restore_to(snapshot).unwrap();

		assert_eq!(db.changes(), before);
		assert_eq!(db.balance(ALICE), U256::from(100));
		assert_eq!(db.nonce(ALICE), 5);
		assert!(db.code(BOB).is_empty());
		assert_eq!(db.storage(BOB, H256::zero()), H256::zero());
		assert!(!db.exists(BOB));
		assert_eq!(db.open_snapshots(), 0);
	}

	#[test]
	fn commit_keeps_writes_under_outer_snapshot() {
		let mut db = overlay();

		let outer = db.snapshot();
		db.set_balance(ALICE, U256::from(90));
		let inner = db.snapshot();
		db.set_balance(BOB, U256::from(10));
		db.commit(inner).unwrap();

		assert_eq!(db.balance(BOB), U256::from(10));
		assert_eq!(db.open_snapshots(), 1);

		db.restore_to(outer).unwrap();
		assert_eq!(db.balance(ALICE), U256::from(100));
		assert_eq!(db.balance(BOB), U256::zero());
	}

	#[test]
	fn restoring_outer_snapshot_drops_inner_ones() {
		let mut db = overlay();

		let outer = db.snapshot();
		db.set_nonce(ALICE, 7);
		let inner = db.snapshot();
		db.set_nonce(ALICE, 8);

		db.restore_to(outer).unwrap();
		assert_eq!(db.nonce(ALICE), 5);
		assert_eq!(db.restore_to(inner), Err(ExitFatal::UnevenSnapshot));
		assert_eq!(db.commit(outer), Err(ExitFatal::UnevenSnapshot));
	}

	#[test]
	fn snapshot_ids_are_not_reused() {
		let mut db = overlay();

		let first = db.snapshot();
		db.restore_to(first).unwrap();
		let second = db.snapshot();

		assert_eq!(first.depth(), second.depth());
		assert_ne!(first.id(), second.id());
		assert_eq!(db.restore_to(first), Err(ExitFatal::UnevenSnapshot));
		db.commit(second).unwrap();
	}

	#[test]
	fn deconstruct_returns_committed_changes() {
		let mut db = overlay();

		let snapshot = db.snapshot();
		db.set_storage(ALICE, H256::zero(), H256::repeat_byte(2));
		db.commit(snapshot).unwrap();
		let dangling = db.snapshot();
		db.set_balance(BOB, U256::one());
		let _ = dangling;

		let (backend, changes) = db.deconstruct();
		assert_eq!(backend.state().len(), 1);
		assert_eq!(changes.storages[&(ALICE, H256::zero())], H256::repeat_byte(2));
		assert_eq!(changes.balances[&BOB], U256::one());
	}
}
