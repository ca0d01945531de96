mod precompile;

pub use self::precompile::{
	linear_cost, PrecompileOutput, PrecompileResult, PrecompileSet, StandardPrecompileSet,
};

use alloc::{rc::Rc, vec::Vec};
use primitive_types::{H160, H256, U256};

use crate::backend::{Database, Snapshot};
use crate::{
	CallError, CallOutcome, CallScheme, Config, Context, CreateOutcome, CreateScheme, Execution,
	ExecutionContext, ExitError, ExitFatal, ExitReason, Frame, Handler, Interpreter, Log,
	NrgBudget, StructLog, Transfer,
};

macro_rules! emit_exit {
	($reason:expr, $return_value:expr) => {{
		event!(Exit {
			reason: &$reason,
			return_value: $return_value,
		});
	}};
}

/// How a frame hands its state changes back to its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackExitKind {
	Succeeded,
	Reverted,
	Failed,
}

/// Database snapshot paired with the log length at the same instant.
#[derive(Debug)]
#[must_use]
struct Checkpoint {
	snapshot: Snapshot,
	logs: usize,
}

/// Result of a dry-run call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Simulation {
	pub outcome: CallOutcome,
	pub nrg_used: u64,
}

/// Stack-based executor.
///
/// Owns the execution context and the database of one transaction, and is
/// the [`Handler`] the interpreter re-enters for every nested frame.
pub struct StackExecutor<'config, 'interpreter, D, I: ?Sized, P> {
	config: &'config Config,
	database: D,
	context: ExecutionContext,
	interpreter: &'interpreter I,
	precompiles: P,
	is_static: bool,
	fatal: Option<ExitFatal>,
}

impl<'config, 'interpreter, D, I> StackExecutor<'config, 'interpreter, D, I, ()>
where
	D: Database,
	I: Interpreter + ?Sized,
{
	/// Create a new stack-based executor without precompiles.
	pub fn new(
		config: &'config Config,
		database: D,
		context: ExecutionContext,
		interpreter: &'interpreter I,
	) -> Self {
		Self::new_with_precompiles(config, database, context, interpreter, ())
	}
}

impl<'config, 'interpreter, D, I, P> StackExecutor<'config, 'interpreter, D, I, P>
where
	D: Database,
	I: Interpreter + ?Sized,
	P: PrecompileSet,
{
	/// Create a new stack-based executor with given precompiles.
	pub fn new_with_precompiles(
		config: &'config Config,
		database: D,
		context: ExecutionContext,
		interpreter: &'interpreter I,
		precompiles: P,
	) -> Self {
		Self {
			config,
			database,
			context,
			interpreter,
			precompiles,
			is_static: false,
			fatal: None,
		}
	}

	pub fn config(&self) -> &'config Config {
		self.config
	}

	pub fn precompiles(&self) -> &P {
		&self.precompiles
	}

	pub fn database(&self) -> &D {
		&self.database
	}

	pub fn database_mut(&mut self) -> &mut D {
		&mut self.database
	}

	pub fn execution_context(&self) -> &ExecutionContext {
		&self.context
	}

	/// Logs of every frame committed so far, in emission order.
	pub fn logs(&self) -> &[Log] {
		self.context.logs()
	}

	/// Fatal condition latched by the last transaction, if any.
	pub fn fatal(&self) -> Option<&ExitFatal> {
		self.fatal.as_ref()
	}

	pub fn deconstruct(self) -> (D, ExecutionContext) {
		(self.database, self.context)
	}

	/// Get the create address from given scheme.
	pub fn create_address(&self, scheme: CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Legacy { caller } => {
				super::create_address(caller, self.database.nonce(caller))
			}
			CreateScheme::Fixed(address) => address,
		}
	}

	/// Execute a `CALL` transaction.
	pub fn transact_call(
		&mut self,
		caller: H160,
		to: H160,
		value: U256,
		data: Vec<u8>,
		nrg: NrgBudget,
	) -> CallOutcome {
		log::debug!(
			target: "evm",
			"Transact call from {:?} to {:?} (value {}, nrg {})",
			caller,
			to,
			value,
			nrg.limit,
		);

		let checkpoint = self.begin_transaction();
		let outcome = self.call_with_scheme(
			CallScheme::Call,
			&Context::external(caller),
			to,
			data,
			nrg,
			value,
		);
		self.finish_transaction(checkpoint);

		outcome
	}

	/// Execute a `CREATE` transaction.
	pub fn transact_create(
		&mut self,
		caller: H160,
		value: U256,
		init_code: Vec<u8>,
		nrg: NrgBudget,
	) -> CreateOutcome {
		log::debug!(
			target: "evm",
			"Transact create from {:?} (value {}, nrg {})",
			caller,
			value,
			nrg.limit,
		);

		let checkpoint = self.begin_transaction();
		let outcome = self.create_inner(
			&Context::external(caller),
			CreateScheme::Legacy { caller },
			init_code,
			nrg,
			value,
		);
		self.finish_transaction(checkpoint);

		outcome
	}

	/// Run a top-level call and throw away every state change and log it
	/// made, successful or not.
	pub fn simulate_call(
		&mut self,
		caller: H160,
		to: H160,
		value: U256,
		data: Vec<u8>,
		nrg: NrgBudget,
	) -> Simulation {
		let checkpoint = self.checkpoint();
		let outcome = self.transact_call(caller, to, value, data, nrg);
		if let Err(fatal) = self.exit_checkpoint(checkpoint, StackExitKind::Reverted) {
			self.latch_fatal(fatal);
		}

		let nrg_used = nrg.limit.saturating_sub(outcome.nrg_left);
		log::debug!(target: "evm", "Simulated call to {:?} used {} nrg", to, nrg_used);

		Simulation { outcome, nrg_used }
	}

	/// Nrg a call would use, without keeping any of its effects.
	pub fn estimate_nrg(
		&mut self,
		caller: H160,
		to: H160,
		value: U256,
		data: Vec<u8>,
		nrg: NrgBudget,
	) -> Result<u64, CallError> {
		let Simulation { outcome, nrg_used } = self.simulate_call(caller, to, value, data, nrg);
		outcome.result.map(|_| nrg_used)
	}

	/// Invoke a creation with an explicit address scheme.
	pub fn create_with_scheme(
		&mut self,
		caller: &Context,
		scheme: CreateScheme,
		init_code: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CreateOutcome {
		self.create_inner(caller, scheme, init_code, nrg, value)
	}

	fn begin_transaction(&mut self) -> Checkpoint {
		self.fatal = None;
		self.is_static = false;
		self.context.set_depth(0);
		self.checkpoint()
	}

	fn finish_transaction(&mut self, checkpoint: Checkpoint) {
		let kind = if self.fatal.is_some() {
			StackExitKind::Failed
		} else {
			StackExitKind::Succeeded
		};

		if let Err(fatal) = self.exit_checkpoint(checkpoint, kind) {
			self.latch_fatal(fatal);
		}
	}

	fn checkpoint(&mut self) -> Checkpoint {
		Checkpoint {
			snapshot: self.database.snapshot(),
			logs: self.context.logs().len(),
		}
	}

	fn exit_checkpoint(
		&mut self,
		checkpoint: Checkpoint,
		kind: StackExitKind,
	) -> Result<(), ExitFatal> {
		match kind {
			StackExitKind::Succeeded => self.database.commit(checkpoint.snapshot),
			StackExitKind::Reverted | StackExitKind::Failed => {
				self.context.truncate_logs(checkpoint.logs);
				self.database.restore_to(checkpoint.snapshot)
			}
		}
	}

	fn latch_fatal(&mut self, fatal: ExitFatal) {
		if self.fatal.is_none() {
			log::warn!(
				target: "evm",
				"Fatal condition at depth {}: {}",
				self.context.depth(),
				fatal,
			);
			self.fatal = Some(fatal);
		}
	}

	/// Settle a finished frame against its checkpoint. A latched fatal
	/// condition overrides whatever the frame reported.
	fn exit_frame(
		&mut self,
		checkpoint: Checkpoint,
		reason: ExitReason,
		output: Vec<u8>,
		nrg_left: u64,
	) -> (Result<Vec<u8>, CallError>, u64) {
		let reason = match self.fatal.clone() {
			Some(fatal) => ExitReason::Fatal(fatal),
			None => reason,
		};
		emit_exit!(reason, &output);

		let (kind, result, nrg_left) = match reason {
			ExitReason::Succeed(_) => (StackExitKind::Succeeded, Ok(output), nrg_left),
			ExitReason::Revert(_) => (
				StackExitKind::Reverted,
				Err(CallError::ExecutionReverted(output)),
				nrg_left,
			),
			ExitReason::Error(e) => (StackExitKind::Failed, Err(e.into()), 0),
			ExitReason::Fatal(e) => {
				self.latch_fatal(e.clone());
				(StackExitKind::Failed, Err(e.into()), 0)
			}
		};

		match self.exit_checkpoint(checkpoint, kind) {
			Ok(()) => (result, nrg_left),
			Err(fatal) => {
				self.latch_fatal(fatal.clone());
				(Err(fatal.into()), 0)
			}
		}
	}

	/// Run one frame one level deeper than the current one.
	fn enter_frame(&mut self, code: Rc<Vec<u8>>, frame: Frame) -> Execution {
		if code.is_empty() {
			return Execution::stopped(frame.nrg.limit);
		}

		let parent_depth = self.context.depth();
		let parent_static = self.is_static;
		self.context.set_depth(frame.depth);
		self.is_static = frame.is_static;

		let interpreter = self.interpreter;
		let execution = interpreter.run(code, &frame, self);

		self.context.set_depth(parent_depth);
		self.is_static = parent_static;

		execution
	}

	/// Checks shared by every call and creation before anything is touched.
	fn preflight(&self, source: H160, value: U256) -> Result<(), CallError> {
		if let Some(fatal) = self.fatal.clone() {
			return Err(fatal.into());
		}
		if self.context.depth() >= self.config.call_stack_limit {
			return Err(ExitError::DepthExceeded.into());
		}
		if self.database.balance(source) < value {
			return Err(ExitError::InsufficientBalance.into());
		}
		Ok(())
	}

	/// Charge the deposit of freshly created code against the nrg left by
	/// its init code.
	fn deposit_cost(&self, code: &[u8], nrg_left: u64) -> Result<u64, ExitError> {
		if let Some(limit) = self.config.create_contract_limit {
			if code.len() > limit {
				return Err(ExitError::ContractLimit);
			}
		}

		(code.len() as u64)
			.checked_mul(self.config.code_deposit_nrg)
			.and_then(|cost| nrg_left.checked_sub(cost))
			.ok_or(ExitError::OutOfNrg)
	}

	fn create_inner(
		&mut self,
		caller: &Context,
		scheme: CreateScheme,
		init_code: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CreateOutcome {
		if self.is_static {
			return CreateOutcome::failed(None, ExitError::StaticModeViolation, 0);
		}
		if let Err(e) = self.preflight(caller.address, value) {
			log::debug!(target: "evm", "Create from {:?} rejected: {}", caller.address, e);
			let nrg_left = if e.is_fatal() { 0 } else { nrg.limit };
			return CreateOutcome::failed(None, e, nrg_left);
		}

		let address = self.create_address(scheme);
		let depth = self.context.depth();

		event!(Create {
			caller: caller.address,
			address,
			scheme,
			value,
			init_code: &init_code,
			nrg_limit: nrg.limit,
		});

		let persist_nonce = self.config.create_nonce_persists_on_failure;
		if persist_nonce {
			if let Err(e) = self.database.inc_nonce(caller.address) {
				emit_exit!(ExitReason::from(e.clone()), &[]);
				return CreateOutcome::failed(Some(address), e, nrg.limit);
			}
		}

		let checkpoint = self.checkpoint();

		if !persist_nonce {
			if let Err(e) = self.database.inc_nonce(caller.address) {
				emit_exit!(ExitReason::from(e.clone()), &[]);
				if let Err(fatal) = self.exit_checkpoint(checkpoint, StackExitKind::Failed) {
					self.latch_fatal(fatal);
				}
				return CreateOutcome::failed(Some(address), e, nrg.limit);
			}
		}

		if !self.database.code(address).is_empty() || self.database.nonce(address) != 0 {
			log::debug!(target: "evm", "Create address collision at {:?}", address);
			self.latch_fatal(ExitFatal::AddressCollision);
			let (result, _) = self.exit_frame(
				checkpoint,
				ExitFatal::AddressCollision.into(),
				Vec::new(),
				0,
			);
			return CreateOutcome {
				address: Some(address),
				result,
				nrg_left: 0,
			};
		}

		let transfer = Transfer {
			source: caller.address,
			target: address,
			value,
		};
		if let Err(e) = self.database.transfer(&transfer) {
			let (result, nrg_left) = self.exit_frame(checkpoint, e.reason(), Vec::new(), 0);
			return CreateOutcome {
				address: Some(address),
				result,
				nrg_left,
			};
		}

		let frame = Frame {
			context: Context {
				address,
				caller: caller.address,
				apparent_value: value,
			},
			code_address: address,
			input: Vec::new(),
			nrg,
			is_delegate: false,
			is_static: false,
			depth: depth + 1,
		};
		let Execution {
			mut reason,
			output,
			mut nrg_left,
		} = self.enter_frame(Rc::new(init_code), frame);

		if reason.is_succeed() && self.fatal.is_none() {
			match self.deposit_cost(&output, nrg_left) {
				Ok(left) => {
					nrg_left = left;
					self.database.set_code(address, output.clone());
				}
				Err(e) => {
					reason = e.into();
					nrg_left = 0;
				}
			}
		}

		let (result, nrg_left) = self.exit_frame(checkpoint, reason, output, nrg_left);
		log::debug!(
			target: "evm",
			"Create {:?} at depth {} finished: success {}, nrg left {}",
			address,
			depth,
			result.is_ok(),
			nrg_left,
		);

		CreateOutcome {
			address: Some(address),
			result,
			nrg_left,
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn call_inner(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		nrg: NrgBudget,
		is_static: bool,
		is_delegate: bool,
		context: Context,
	) -> CallOutcome {
		event!(Call {
			code_address,
			transfer: &transfer,
			input: &input,
			nrg_limit: nrg.limit,
			is_static,
			context: &context,
		});

		let (source, value) = transfer
			.as_ref()
			.map(|t| (t.source, t.value))
			.unwrap_or((context.caller, U256::zero()));
		if let Err(e) = self.preflight(source, value) {
			log::debug!(target: "evm", "Call to {:?} rejected: {}", code_address, e);
			emit_exit!(e.reason(), &[]);
			let nrg_left = if e.is_fatal() { 0 } else { nrg.limit };
			return CallOutcome::failed(e, nrg_left);
		}

		let depth = self.context.depth();
		let checkpoint = self.checkpoint();

		if let Some(transfer) = transfer.as_ref() {
			if let Err(e) = self.database.transfer(transfer) {
				let (result, nrg_left) = self.exit_frame(checkpoint, e.reason(), Vec::new(), 0);
				return CallOutcome { result, nrg_left };
			}
		}

		let execution = match self
			.precompiles
			.execute(code_address, &input, nrg.limit, &context)
		{
			Some(Ok(output)) => {
				Execution::returned(output.output, nrg.limit.saturating_sub(output.cost))
			}
			Some(Err(e)) => Execution::error(e),
			None => {
				let code = Rc::new(self.database.code(code_address));
				let frame = Frame {
					context,
					code_address,
					input,
					nrg,
					is_delegate,
					is_static,
					depth: depth + 1,
				};
				self.enter_frame(code, frame)
			}
		};

		let (result, nrg_left) = self.exit_frame(
			checkpoint,
			execution.reason,
			execution.output,
			execution.nrg_left,
		);
		log::debug!(
			target: "evm",
			"Call to {:?} at depth {} finished: success {}, nrg left {}",
			code_address,
			depth,
			result.is_ok(),
			nrg_left,
		);

		CallOutcome { result, nrg_left }
	}
}

impl<'config, 'interpreter, D, I, P> Handler for StackExecutor<'config, 'interpreter, D, I, P>
where
	D: Database,
	I: Interpreter + ?Sized,
	P: PrecompileSet,
{
	fn balance(&self, address: H160) -> U256 {
		self.database.balance(address)
	}

	fn nonce(&self, address: H160) -> u64 {
		self.database.nonce(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.database.code(address)
	}

	fn code_hash(&self, address: H160) -> H256 {
		self.database.code_hash(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.database.storage(address, index)
	}

	fn exists(&self, address: H160) -> bool {
		self.database.exists(address) || self.precompiles.is_precompile(address)
	}

	fn context(&self) -> &ExecutionContext {
		&self.context
	}

	fn is_static(&self) -> bool {
		self.is_static
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		if self.is_static {
			return Err(ExitError::StaticModeViolation);
		}
		self.database.set_storage(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		if self.is_static {
			return Err(ExitError::StaticModeViolation);
		}
		self.context.add_log(Log {
			address,
			topics,
			data,
		});
		Ok(())
	}

	fn add_struct_log(&mut self, log: StructLog) {
		self.context.add_struct_log(log);
	}

	fn call_with_scheme(
		&mut self,
		scheme: CallScheme,
		caller: &Context,
		target: H160,
		input: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CallOutcome {
		if self.is_static && scheme.transfers_value() && !value.is_zero() {
			return CallOutcome::failed(ExitError::StaticModeViolation, 0);
		}

		let (context, transfer) = match scheme {
			CallScheme::Call => (
				Context {
					address: target,
					caller: caller.address,
					apparent_value: value,
				},
				Some(Transfer {
					source: caller.address,
					target,
					value,
				}),
			),
			CallScheme::CallCode => (
				Context {
					address: caller.address,
					caller: caller.address,
					apparent_value: value,
				},
				Some(Transfer {
					source: caller.address,
					target: caller.address,
					value,
				}),
			),
			CallScheme::DelegateCall => (
				Context {
					address: caller.address,
					caller: caller.caller,
					apparent_value: caller.apparent_value,
				},
				None,
			),
			CallScheme::StaticCall => (
				Context {
					address: target,
					caller: caller.address,
					apparent_value: U256::zero(),
				},
				None,
			),
		};

		// Static frames leave balances alone, so a zero-value call cannot
		// bring an empty account into existence.
		let transfer = if self.is_static { None } else { transfer };
		let is_static = self.is_static || scheme == CallScheme::StaticCall;
		let is_delegate = scheme == CallScheme::DelegateCall;

		self.call_inner(target, transfer, input, nrg, is_static, is_delegate, context)
	}

	fn create(
		&mut self,
		caller: &Context,
		init_code: Vec<u8>,
		nrg: NrgBudget,
		value: U256,
	) -> CreateOutcome {
		self.create_inner(
			caller,
			CreateScheme::Legacy {
				caller: caller.address,
			},
			init_code,
			nrg,
			value,
		)
	}
}
