use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

/// Exit reason of a frame, as reported by the interpreter.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
	/// Machine has finished execution.
	Succeed(ExitSucceed),
	/// Machine encountered an exceptional halt. All nrg of the frame is consumed.
	Error(ExitError),
	/// Machine encountered an explicit revert.
	Revert(ExitRevert),
	/// Machine encountered a condition that aborts the whole transaction.
	Fatal(ExitFatal),
}

impl ExitReason {
	/// Whether the exit is succeeded.
	pub fn is_succeed(&self) -> bool {
		matches!(self, Self::Succeed(_))
	}

	/// Whether the exit is fatal.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop, or ran off the end of its code.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
}

impl From<ExitSucceed> for ExitReason {
	fn from(s: ExitSucceed) -> Self {
		Self::Succeed(s)
	}
}

/// Exit revert reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitRevert {
	/// Machine encountered an explicit revert.
	Reverted,
}

impl From<ExitRevert> for ExitReason {
	fn from(s: ExitRevert) -> Self {
		Self::Revert(s)
	}
}

/// Recoverable failure of a frame. The invoking contract sees a failed call,
/// the enclosing transaction carries on.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// Call depth reached the configured call stack limit.
	DepthExceeded,
	/// The caller cannot afford the value it tries to send.
	InsufficientBalance,
	/// The frame ran out of nrg.
	OutOfNrg,
	/// A state modification was attempted inside a static frame.
	StaticModeViolation,
	/// The nonce of the creating account cannot be incremented any further.
	MaxNonce,
	/// Deployed code exceeds the configured contract size limit.
	ContractLimit,
	/// The interpreter rejected the code it was asked to run.
	InvalidCode,
	/// Other interpreter-specific halt.
	Other(Cow<'static, str>),
}

impl From<ExitError> for ExitReason {
	fn from(s: ExitError) -> Self {
		Self::Error(s)
	}
}

impl fmt::Display for ExitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DepthExceeded => write!(f, "max call depth exceeded"),
			Self::InsufficientBalance => write!(f, "insufficient balance for transfer"),
			Self::OutOfNrg => write!(f, "out of nrg"),
			Self::StaticModeViolation => write!(f, "state modification in static call"),
			Self::MaxNonce => write!(f, "nonce overflow"),
			Self::ContractLimit => write!(f, "contract code size limit exceeded"),
			Self::InvalidCode => write!(f, "invalid code"),
			Self::Other(msg) => write!(f, "{}", msg),
		}
	}
}

/// Unrecoverable failure. Aborts the entire transaction with no partial commit.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	/// Contract creation targeted an address that already holds code or a nonce.
	AddressCollision,
	/// A credit would overflow the recipient balance.
	BalanceOverflow,
	/// A snapshot handle was restored or committed out of order.
	UnevenSnapshot,
	/// Other fatal condition signalled by the interpreter.
	Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitReason {
	fn from(s: ExitFatal) -> Self {
		Self::Fatal(s)
	}
}

impl fmt::Display for ExitFatal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AddressCollision => write!(f, "contract address collision"),
			Self::BalanceOverflow => write!(f, "balance overflow"),
			Self::UnevenSnapshot => write!(f, "snapshot restored out of order"),
			Self::Other(msg) => write!(f, "fatal: {}", msg),
		}
	}
}

/// Error half of a call or create outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallError {
	/// The callee reverted, carrying its return data.
	ExecutionReverted(Vec<u8>),
	/// The call failed before or during execution.
	Error(ExitError),
	/// The transaction must be aborted.
	Fatal(ExitFatal),
}

impl CallError {
	/// Whether this error aborts the enclosing transaction.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}

	/// Revert data, if the callee reverted.
	pub fn revert_data(&self) -> Option<&[u8]> {
		match self {
			Self::ExecutionReverted(data) => Some(&data[..]),
			_ => None,
		}
	}

	/// Exit reason equivalent to this error.
	pub fn reason(&self) -> ExitReason {
		match self {
			Self::ExecutionReverted(_) => ExitRevert::Reverted.into(),
			Self::Error(e) => e.clone().into(),
			Self::Fatal(e) => e.clone().into(),
		}
	}
}

impl From<ExitError> for CallError {
	fn from(e: ExitError) -> Self {
		Self::Error(e)
	}
}

impl From<ExitFatal> for CallError {
	fn from(e: ExitFatal) -> Self {
		Self::Fatal(e)
	}
}

impl fmt::Display for CallError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ExecutionReverted(data) if data.is_empty() => write!(f, "execution reverted"),
			Self::ExecutionReverted(data) => {
				write!(f, "execution reverted: 0x")?;
				for byte in data {
					write!(f, "{:02x}", byte)?;
				}
				Ok(())
			}
			Self::Error(e) => fmt::Display::fmt(e, f),
			Self::Fatal(e) => fmt::Display::fmt(e, f),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitError {}

#[cfg(feature = "std")]
impl std::error::Error for ExitFatal {}

#[cfg(feature = "std")]
impl std::error::Error for CallError {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::string::ToString;

	#[test]
	fn revert_message_is_hex_encoded() {
		let err = CallError::ExecutionReverted(hex::decode("08c379a0").unwrap());
		assert_eq!(err.to_string(), "execution reverted: 0x08c379a0");
		assert_eq!(CallError::ExecutionReverted(Vec::new()).to_string(), "execution reverted");
	}

	#[test]
	fn only_fatal_errors_abort() {
		assert!(CallError::from(ExitFatal::AddressCollision).is_fatal());
		assert!(!CallError::from(ExitError::DepthExceeded).is_fatal());
		assert!(!CallError::ExecutionReverted(Vec::new()).is_fatal());
		assert!(CallError::from(ExitFatal::UnevenSnapshot).reason().is_fatal());
	}
}
