//! # Call orchestration
//!
//! The stack executor drives message calls and creations frame by frame,
//! guarding each frame with a database snapshot.

pub mod stack;

pub use self::stack::{
	linear_cost, PrecompileOutput, PrecompileResult, PrecompileSet, Simulation, StackExecutor,
	StackExitKind, StandardPrecompileSet,
};

use primitive_types::{H160, H256};
use sha3::{Digest, Keccak256};

/// Address of the contract `caller` creates with the given nonce:
/// the last 20 bytes of `keccak256(rlp([caller, nonce]))`.
pub fn create_address(caller: H160, nonce: u64) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller);
	stream.append(&nonce);
	H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::str::FromStr;

	#[test]
	fn create_address_follows_nonce() {
		let caller = H160::from_str("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap();

		assert_eq!(
			create_address(caller, 0),
			H160::from_str("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d").unwrap()
		);
		assert_eq!(
			create_address(caller, 1),
			H160::from_str("343c43a37d37dff08ae8c4a11544c718abb4fcf8").unwrap()
		);
		assert_eq!(
			create_address(caller, 2),
			H160::from_str("f778b86fa74e846c4f0a1fbd1335fe81c00a0c91").unwrap()
		);
	}
}
