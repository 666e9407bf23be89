//! Helpers for configuration tests that run inside a `figment::Jail`.

use anyhow::{Result, anyhow};

/// Executes `f` inside a [`figment::Jail`] and returns its output.
///
/// The jail gives the closure a scratch working directory and restores the
/// environment afterwards, so `INJECTCONF_*` overrides never leak.
///
/// # Errors
///
/// Returns an error if the jail cannot be created or the closure fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}

/// Converts any displayable error into a [`figment::Error`] so it can cross
/// a jail closure boundary with `?`.
#[expect(
    clippy::needless_pass_by_value,
    reason = "used as a map_err adapter that receives owned errors"
)]
pub fn figment_error<E: ToString>(err: E) -> figment::Error {
    figment::Error::from(err.to_string())
}
