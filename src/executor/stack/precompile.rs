use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::{H160, H256};
use sha2::Digest as _;
use sha3::Keccak256;

use crate::{Context, ExitError};

/// A precompile result.
pub type PrecompileResult = Result<PrecompileOutput, ExitError>;

/// Data returned by a precompile on success.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct PrecompileOutput {
	pub output: Vec<u8>,
	/// Nrg consumed by the precompile.
	pub cost: u64,
}

/// Native contracts consulted before the interpreter.
pub trait PrecompileSet {
	/// Run the precompile at `address`, if there is one. A failure consumes
	/// all of `nrg_limit`.
	fn execute(
		&self,
		address: H160,
		input: &[u8],
		nrg_limit: u64,
		context: &Context,
	) -> Option<PrecompileResult>;

	/// Check if the given address is a precompile.
	fn is_precompile(&self, address: H160) -> bool;
}

impl PrecompileSet for () {
	fn execute(&self, _: H160, _: &[u8], _: u64, _: &Context) -> Option<PrecompileResult> {
		None
	}

	fn is_precompile(&self, _: H160) -> bool {
		false
	}
}

/// `base + word * ceil(len / 32)`.
pub fn linear_cost(len: u64, base: u64, word: u64) -> Result<u64, ExitError> {
	let words = len.saturating_add(31) / 32;
	words
		.checked_mul(word)
		.and_then(|cost| cost.checked_add(base))
		.ok_or(ExitError::OutOfNrg)
}

fn charge(cost: u64, nrg_limit: u64) -> Result<u64, ExitError> {
	if cost > nrg_limit {
		return Err(ExitError::OutOfNrg);
	}
	Ok(cost)
}

/// The Frontier precompiles: ecrecover (`0x01`), sha256 (`0x02`),
/// ripemd160 (`0x03`) and identity (`0x04`).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPrecompileSet;

impl StandardPrecompileSet {
	pub const ECRECOVER: H160 = H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
	]);
	pub const SHA256: H160 = H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2,
	]);
	pub const RIPEMD160: H160 = H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3,
	]);
	pub const IDENTITY: H160 = H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4,
	]);

	pub fn new() -> Self {
		Self
	}
}

impl PrecompileSet for StandardPrecompileSet {
	fn execute(
		&self,
		address: H160,
		input: &[u8],
		nrg_limit: u64,
		_context: &Context,
	) -> Option<PrecompileResult> {
		let result = match address {
			a if a == Self::ECRECOVER => ecrecover(input, nrg_limit),
			a if a == Self::SHA256 => sha256(input, nrg_limit),
			a if a == Self::RIPEMD160 => ripemd160(input, nrg_limit),
			a if a == Self::IDENTITY => identity(input, nrg_limit),
			_ => return None,
		};

		log::trace!(target: "evm", "Precompile {:?}: {:?}", address, result);
		Some(result)
	}

	fn is_precompile(&self, address: H160) -> bool {
		address == Self::ECRECOVER
			|| address == Self::SHA256
			|| address == Self::RIPEMD160
			|| address == Self::IDENTITY
	}
}

fn ecrecover(i: &[u8], nrg_limit: u64) -> PrecompileResult {
	let cost = charge(linear_cost(i.len() as u64, 3000, 0)?, nrg_limit)?;
	let unrecoverable = Ok(PrecompileOutput {
		output: Vec::new(),
		cost,
	});

	let mut input = [0u8; 128];
	input[..min(i.len(), 128)].copy_from_slice(&i[..min(i.len(), 128)]);

	// v is a full 32-byte word holding 27 or 28.
	if input[32..63] != [0u8; 31] || ![27, 28].contains(&input[63]) {
		return unrecoverable;
	}

	let mut msg = [0u8; 32];
	msg.copy_from_slice(&input[0..32]);
	let message = libsecp256k1::Message::parse(&msg);
	let signature = match libsecp256k1::Signature::parse_standard_slice(&input[64..128]) {
		Ok(signature) => signature,
		Err(_) => return unrecoverable,
	};
	let recovery_id = match libsecp256k1::RecoveryId::parse(input[63] - 27) {
		Ok(recovery_id) => recovery_id,
		Err(_) => return unrecoverable,
	};
	let public = match libsecp256k1::recover(&message, &signature, &recovery_id) {
		Ok(public) => public,
		Err(_) => return unrecoverable,
	};

	let mut address = H256::from_slice(Keccak256::digest(&public.serialize()[1..]).as_slice());
	address.0[0..12].copy_from_slice(&[0u8; 12]);

	Ok(PrecompileOutput {
		output: address.0.to_vec(),
		cost,
	})
}

fn sha256(input: &[u8], nrg_limit: u64) -> PrecompileResult {
	let cost = charge(linear_cost(input.len() as u64, 60, 12)?, nrg_limit)?;
	let hash = sha2::Sha256::digest(input);

	Ok(PrecompileOutput {
		output: hash.to_vec(),
		cost,
	})
}

fn ripemd160(input: &[u8], nrg_limit: u64) -> PrecompileResult {
	let cost = charge(linear_cost(input.len() as u64, 600, 120)?, nrg_limit)?;

	let mut ret = [0u8; 32];
	let hash = ripemd::Ripemd160::digest(input);
	ret[12..32].copy_from_slice(&hash);

	Ok(PrecompileOutput {
		output: ret.to_vec(),
		cost,
	})
}

fn identity(input: &[u8], nrg_limit: u64) -> PrecompileResult {
	let cost = charge(linear_cost(input.len() as u64, 15, 3)?, nrg_limit)?;

	Ok(PrecompileOutput {
		output: input.to_vec(),
		cost,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(address: H160, input: &[u8], nrg_limit: u64) -> PrecompileResult {
		StandardPrecompileSet
			.execute(address, input, nrg_limit, &Context::external(H160::zero()))
			.unwrap()
	}

	#[test]
	fn linear_cost_rounds_up_to_words() {
		assert_eq!(linear_cost(0, 15, 3), Ok(15));
		assert_eq!(linear_cost(1, 15, 3), Ok(18));
		assert_eq!(linear_cost(32, 15, 3), Ok(18));
		assert_eq!(linear_cost(33, 15, 3), Ok(21));
		assert_eq!(linear_cost(u64::MAX, 1, u64::MAX), Err(ExitError::OutOfNrg));
	}

	#[test]
	fn identity_echoes_input() {
		let output = run(StandardPrecompileSet::IDENTITY, b"hello", 100).unwrap();
		assert_eq!(output.output, b"hello".to_vec());
		assert_eq!(output.cost, 18);
	}

	#[test]
	fn cost_above_limit_is_out_of_nrg() {
		assert_eq!(
			run(StandardPrecompileSet::SHA256, &[], 59),
			Err(ExitError::OutOfNrg)
		);
		assert_eq!(
			run(StandardPrecompileSet::RIPEMD160, &[0u8; 33], 839),
			Err(ExitError::OutOfNrg)
		);
	}

	#[test]
	fn hashes_of_empty_input() {
		let sha = run(StandardPrecompileSet::SHA256, &[], 60).unwrap();
		assert_eq!(
			hex::encode(sha.output),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);

		let ripemd = run(StandardPrecompileSet::RIPEMD160, &[], 600).unwrap();
		assert_eq!(
			hex::encode(ripemd.output),
			"0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31"
		);
	}

	#[test]
	fn ecrecover_recovers_signer() {
		let secret = libsecp256k1::SecretKey::parse(&[0x42; 32]).unwrap();
		let public = libsecp256k1::PublicKey::from_secret_key(&secret);
		let signer = H160::from_slice(&Keccak256::digest(&public.serialize()[1..])[12..]);

		let hash = [0x17u8; 32];
		let (signature, recovery_id) =
			libsecp256k1::sign(&libsecp256k1::Message::parse(&hash), &secret);

		let mut input = Vec::new();
		input.extend_from_slice(&hash);
		input.extend_from_slice(&[0u8; 31]);
		input.push(27 + recovery_id.serialize());
		input.extend_from_slice(&signature.serialize());

		let output = run(StandardPrecompileSet::ECRECOVER, &input, 3000).unwrap();
		assert_eq!(output.cost, 3000);
		assert_eq!(H256::from_slice(&output.output), H256::from(signer));
	}

	#[test]
	fn ecrecover_with_bad_v_returns_nothing() {
		let mut input = [0u8; 128];
		input[63] = 29;
		let output = run(StandardPrecompileSet::ECRECOVER, &input, 3000).unwrap();
		assert!(output.output.is_empty());
	}

	#[test]
	fn unknown_address_is_not_a_precompile() {
		let set = StandardPrecompileSet::new();
		assert!(!set.is_precompile(H160::from_low_u64_be(5)));
		assert!(set.is_precompile(StandardPrecompileSet::IDENTITY));
		assert!(set
			.execute(H160::from_low_u64_be(5), &[], 100, &Context::external(H160::zero()))
			.is_none());
	}
}
