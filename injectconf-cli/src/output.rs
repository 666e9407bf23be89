//! Output writers for `injectconf`.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use injectconf::ModulePlan;
use std::io::Write;

use crate::error::InjectconfCliError;

/// Directory under the output root that receives plans.
pub const PLANS_DIR: &str = "plans";

/// File name of a plan: `<Root>.<source>.json`.
#[must_use]
pub fn plan_file_name(plan: &ModulePlan) -> String {
    format!("{}.{}.json", plan.root, plan.source.as_str())
}

/// Writes `plan` as pretty JSON under `out_dir/plans/`.
///
/// # Errors
///
/// Returns [`InjectconfCliError::Io`] when the directory or file cannot be
/// written and [`InjectconfCliError::PlanJson`] when serialization fails.
pub fn write_plan(out_dir: &Utf8Path, plan: &ModulePlan) -> Result<Utf8PathBuf, InjectconfCliError> {
    let dir = ensure_dir(out_dir)?;
    let plans_dir = out_dir.join(PLANS_DIR);
    let io_err = |path: &Utf8Path| {
        let path = path.to_path_buf();
        move |source| InjectconfCliError::Io { path, source }
    };
    dir.create_dir_all(PLANS_DIR).map_err(io_err(out_dir))?;
    let plans = dir.open_dir(PLANS_DIR).map_err(io_err(&plans_dir))?;

    let filename = plan_file_name(plan);
    let target = plans_dir.join(&filename);
    let mut file = plans
        .open_with(
            &filename,
            OpenOptions::new().write(true).create(true).truncate(true),
        )
        .map_err(io_err(&target))?;
    let mut content = serde_json::to_string_pretty(plan)?;
    content.push('\n');
    file.write_all(content.as_bytes()).map_err(io_err(&target))?;
    Ok(target)
}

fn ensure_dir(path: &Utf8Path) -> Result<Dir, InjectconfCliError> {
    let io_err = |source| InjectconfCliError::Io {
        path: path.to_path_buf(),
        source,
    };
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(open_err) if open_err.kind() == std::io::ErrorKind::NotFound => {
            Dir::create_ambient_dir_all(path, ambient_authority()).map_err(io_err)?;
            Dir::open_ambient_dir(path, ambient_authority()).map_err(io_err)
        }
        Err(open_err) => Err(io_err(open_err)),
    }
}
