pub mod configuration;
pub mod environment;
pub mod error;
pub mod values;
pub mod version1;

pub use configuration::{generate_schema, make_runtime_configuration, Configuration};
pub use environment::{Environment, FixedEnvironment, ProcessEnvironment, Variable};
pub use error::{MakeRuntimeConfigurationError, ParseConfigurationError};
pub use values::{ConnectionUri, PoolSettings, Secret};
pub use version1::{parse_configuration, ParsedConfiguration, CONFIGURATION_FILENAME};
