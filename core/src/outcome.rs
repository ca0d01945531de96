use alloc::vec::Vec;
use primitive_types::H160;

use crate::CallError;

/// Result of a message call as seen by the invoking frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallOutcome {
	/// Return data on success, the reason otherwise.
	pub result: Result<Vec<u8>, CallError>,
	/// Nrg handed back to the invoking frame.
	pub nrg_left: u64,
}

impl CallOutcome {
	pub fn failed<E: Into<CallError>>(error: E, nrg_left: u64) -> Self {
		Self {
			result: Err(error.into()),
			nrg_left,
		}
	}

	pub fn is_success(&self) -> bool {
		self.result.is_ok()
	}

	/// Return data on success, revert data on revert, empty otherwise.
	pub fn output(&self) -> &[u8] {
		match &self.result {
			Ok(output) => &output[..],
			Err(err) => err.revert_data().unwrap_or(&[]),
		}
	}

	pub fn error(&self) -> Option<&CallError> {
		self.result.as_ref().err()
	}
}

/// Result of a contract creation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateOutcome {
	/// Address the contract was (or would have been) deployed to. `None` when
	/// the creation failed before an address was derived.
	pub address: Option<H160>,
	/// Deployed code on success, the reason otherwise.
	pub result: Result<Vec<u8>, CallError>,
	/// Nrg handed back to the invoking frame.
	pub nrg_left: u64,
}

impl CreateOutcome {
	pub fn failed<E: Into<CallError>>(address: Option<H160>, error: E, nrg_left: u64) -> Self {
		Self {
			address,
			result: Err(error.into()),
			nrg_left,
		}
	}

	pub fn is_success(&self) -> bool {
		self.result.is_ok()
	}

	/// Address of the deployed contract, only if the creation succeeded.
	pub fn deployed(&self) -> Option<H160> {
		self.result.as_ref().ok().and(self.address)
	}

	pub fn error(&self) -> Option<&CallError> {
		self.result.as_ref().err()
	}
}
