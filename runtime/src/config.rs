/// Orchestrator configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
pub struct Config {
	/// Maximum number of nested frames. A call or create attempted at this
	/// depth fails with `DepthExceeded`.
	pub call_stack_limit: usize,
	/// Whether the nonce bump of a creating account survives a failed
	/// creation. When `false` the bump is rolled back with the rest of the
	/// creation.
	pub create_nonce_persists_on_failure: bool,
	/// Maximum size of deployed code.
	pub create_contract_limit: Option<usize>,
	/// Nrg charged per byte of deployed code.
	pub code_deposit_nrg: u64,
}

impl Config {
	/// Homestead rules.
	pub const fn homestead() -> Config {
		Config {
			call_stack_limit: 1024,
			create_nonce_persists_on_failure: true,
			create_contract_limit: None,
			code_deposit_nrg: 200,
		}
	}

	/// Load a configuration from YAML. Missing keys take their Homestead value.
	#[cfg(all(feature = "std", feature = "with-serde"))]
	pub fn from_yaml(source: &str) -> Result<Config, serde_yaml::Error> {
		serde_yaml::from_str(source)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self::homestead()
	}
}

#[cfg(all(test, feature = "std", feature = "with-serde"))]
mod tests {
	use super::*;

	#[test]
	fn yaml_overrides_defaults() {
		let config = Config::from_yaml(
			"call_stack_limit: 64\n\
			 create_nonce_persists_on_failure: false\n\
			 create_contract_limit: 24576\n",
		)
		.unwrap();

		assert_eq!(
			config,
			Config {
				call_stack_limit: 64,
				create_nonce_persists_on_failure: false,
				create_contract_limit: Some(24576),
				code_deposit_nrg: 200,
			}
		);
	}

	#[test]
	fn empty_yaml_is_homestead() {
		assert_eq!(Config::from_yaml("{}").unwrap(), Config::homestead());
	}

	#[test]
	fn yaml_rejects_unknown_types() {
		assert!(Config::from_yaml("call_stack_limit: deep\n").is_err());
	}
}
