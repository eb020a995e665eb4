//! Validation wrappers over the engine's log configuration.

use tether_engine::Engine;

use crate::{Error, Result};

/// Changes the engine's log verbosity. Fails on negative levels before
/// the boundary is touched.
pub fn set_log_verbosity_level<E: Engine>(level: i32) -> Result<()> {
	if level < 0 {
		return Err(Error::InvalidArgument("log verbosity level must be non-negative"));
	}
	E::set_log_verbosity_level(level);
	Ok(())
}

/// Redirects the engine's internal log to `path`; an empty path reverts
/// to the engine's default sink. Returns whether the engine accepted the
/// sink.
pub fn set_log_file_path<E: Engine>(path: &str) -> bool {
	E::set_log_file_path(path)
}

/// Changes the engine's log-file rotation threshold. Fails on
/// non-positive sizes before the boundary is touched.
pub fn set_log_max_file_size<E: Engine>(max_file_size: i64) -> Result<()> {
	if max_file_size <= 0 {
		return Err(Error::InvalidArgument("log max file size must be positive"));
	}
	E::set_log_max_file_size(max_file_size);
	Ok(())
}
