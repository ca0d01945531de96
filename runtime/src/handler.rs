use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

use crate::{
	CallOutcome, CallScheme, Context, CreateOutcome, ExecutionContext, ExitError, NrgBudget,
	StructLog,
};

/// Environment of a running frame, as seen by the interpreter.
///
/// Nested message calls re-enter the orchestrator through this trait, so a
/// failed nested call comes back as a [`CallOutcome`] and never unwinds the
/// invoking frame.
pub trait Handler {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get nonce of address.
	fn nonce(&self, address: H160) -> u64;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get code hash of address.
	fn code_hash(&self, address: H160) -> H256;
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;

	/// Block and transaction facts, plus the current call depth.
	fn context(&self) -> &ExecutionContext;
	/// Whether the running frame may modify state.
	fn is_static(&self) -> bool;

	/// Set storage value of address at index.
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	/// Create a log owned by address with given topics and data.
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;
	/// Record one interpreter step in the transaction trace.
	fn add_struct_log(&mut self, log: StructLog);

	/// Invoke a message call of the given scheme on behalf of `caller`.
	///
	/// `target` is the callee for `Call` and `StaticCall`, and the code
	/// address for `CallCode` and `DelegateCall`. `value` is ignored by the
	/// schemes that do not transfer.
	fn call_with_scheme(
		&mut self,
		scheme: CallScheme,
		caller: &Context,
		target: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CallOutcome;

	/// Invoke a contract creation on behalf of `caller`.
	fn create(
		&mut self,
		caller: &Context,
		init_code: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CreateOutcome;

	/// `CALL`: run `to`'s code at `to`, sending `value`.
	fn call(
		&mut self,
		caller: &Context,
		to: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CallOutcome {
		self.call_with_scheme(CallScheme::Call, caller, to, input, nrg, value)
	}

	/// `CALLCODE`: run `code_address`'s code against the caller's own account.
	fn call_code(
		&mut self,
		caller: &Context,
		code_address: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CallOutcome {
		self.call_with_scheme(CallScheme::CallCode, caller, code_address, input, nrg, value)
	}

	/// `DELEGATECALL`: like `CALLCODE`, keeping the caller's sender and value.
	fn delegate_call(
		&mut self,
		caller: &Context,
		code_address: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
	) -> CallOutcome {
		self.call_with_scheme(
			CallScheme::DelegateCall,
			caller,
			code_address,
			input,
			nrg,
			U256::zero(),
		)
	}

	/// `STATICCALL`: like `CALL` without value, forbidding state changes.
	fn static_call(
		&mut self,
		caller: &Context,
		to: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
	) -> CallOutcome {
		self.call_with_scheme(CallScheme::StaticCall, caller, to, input, nrg, U256::zero())
	}
}
