//! Config command implementation

use vaultsync_core::ConfigResolver;

use super::ExitStatus;
use crate::error::Result;

/// Print the resolved configuration as TOML
pub fn run_config(resolver: &ConfigResolver) -> Result<ExitStatus> {
    let config = resolver.resolve()?;
    if let Some(path) = resolver.explicit_path() {
        println!("# resolved with {}", path.display());
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(ExitStatus::Success)
}
