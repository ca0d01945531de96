use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

use super::{ApplyBackend, Backend, Basic, ChangeSet};

/// Account information of a memory backend.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: u64,
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

/// Memory backend, storing all state values in a `BTreeMap` in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
	state: BTreeMap<H160, MemoryAccount>,
}

impl MemoryBackend {
	/// Create a new memory backend.
	pub fn new(state: BTreeMap<H160, MemoryAccount>) -> Self {
		Self { state }
	}

	/// Get the underlying `BTreeMap` storing the state.
	pub fn state(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.state
	}

	/// Sum of all balances held in the backend.
	pub fn total_balance(&self) -> U256 {
		self.state
			.values()
			.fold(U256::zero(), |acc, account| acc.saturating_add(account.balance))
	}
}

impl Backend for MemoryBackend {
	fn basic(&self, address: H160) -> Basic {
		self.state
			.get(&address)
			.map(|a| Basic {
				balance: a.balance,
				nonce: a.nonce,
			})
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state
			.get(&address)
			.map(|v| v.code.clone())
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state
			.get(&address)
			.map(|v| v.storage.get(&index).cloned().unwrap_or_default())
			.unwrap_or_default()
	}

	fn exists(&self, address: H160) -> bool {
		self.state.contains_key(&address)
	}
}

impl ApplyBackend for MemoryBackend {
	fn apply(&mut self, changes: ChangeSet) {
		for (address, balance) in changes.balances {
			self.state.entry(address).or_default().balance = balance;
		}

		for (address, nonce) in changes.nonces {
			self.state.entry(address).or_default().nonce = nonce;
		}

		for (address, code) in changes.codes {
			self.state.entry(address).or_default().code = code;
		}

		for ((address, index), value) in changes.storages {
			let account = self.state.entry(address).or_default();
			if value == H256::default() {
				account.storage.remove(&index);
			} else {
				account.storage.insert(index, value);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn apply_writes_and_clears_storage() {
		let address = H160::from_low_u64_be(1);
		let mut backend = MemoryBackend::new(BTreeMap::from([(
			address,
			MemoryAccount {
				balance: U256::from(10),
				storage: BTreeMap::from([(H256::from_low_u64_be(1), H256::from_low_u64_be(1))]),
				..Default::default()
			},
		)]));

		let mut changes = ChangeSet::default();
		changes.balances.insert(address, U256::from(7));
		changes.nonces.insert(address, 3);
		changes
			.storages
			.insert((address, H256::from_low_u64_be(1)), H256::default());
		changes
			.storages
			.insert((address, H256::from_low_u64_be(2)), H256::from_low_u64_be(9));
		backend.apply(changes);

		let account = &backend.state()[&address];
		assert_eq!(account.balance, U256::from(7));
		assert_eq!(account.nonce, 3);
		assert_eq!(
			account.storage,
			BTreeMap::from([(H256::from_low_u64_be(2), H256::from_low_u64_be(9))])
		);
	}

	#[test]
	fn missing_accounts_read_as_empty() {
		let backend = MemoryBackend::default();
		let address = H160::repeat_byte(0x42);

		assert!(!backend.exists(address));
		assert_eq!(backend.basic(address), Basic::default());
		assert!(backend.code(address).is_empty());
		assert_eq!(backend.storage(address, H256::zero()), H256::zero());
	}
}
