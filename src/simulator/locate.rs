use crate::{
    constants::{SIMULATOR_BINARY_NAME, SIMULATOR_BUILD_DIR, SIMULATOR_PATH_ENV},
    error::SimulationError,
};
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Locates the simulator executable.
///
/// Candidates are tried in order:
/// 1. `explicit`, usually the configured path;
/// 2. the [`SIMULATOR_PATH_ENV`] environment variable;
/// 3. [`SIMULATOR_BINARY_NAME`] in the working directory;
/// 4. [`SIMULATOR_BINARY_NAME`] in [`SIMULATOR_BUILD_DIR`];
/// 5. every directory of `PATH`.
///
/// An override (1 or 2) that does not point at a file is an error rather than a reason to keep
/// looking.
pub fn locate_simulator(explicit: Option<&Path>) -> Result<PathBuf, SimulationError> {
    Locator {
        explicit: explicit.map(Path::to_path_buf),
        env_override: env::var_os(SIMULATOR_PATH_ENV).filter(|path| !path.is_empty()),
        cwd: env::current_dir().ok(),
        search_path: env::var_os("PATH"),
    }
    .locate()
}

/// Inputs of the lookup, captured up front so the lookup itself is pure.
#[derive(Debug, Default)]
struct Locator {
    explicit: Option<PathBuf>,
    env_override: Option<OsString>,
    cwd: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl Locator {
    fn locate(self) -> Result<PathBuf, SimulationError> {
        if let Some(path) = self.explicit {
            return checked_override(path, "configured simulator path");
        }

        if let Some(path) = self.env_override {
            return checked_override(PathBuf::from(path), SIMULATOR_PATH_ENV);
        }

        let binary = format!("{SIMULATOR_BINARY_NAME}{}", env::consts::EXE_SUFFIX);
        let local = self.cwd.iter().map(|cwd| cwd.join(&binary));
        let build = self.cwd.iter().map(|cwd| cwd.join(SIMULATOR_BUILD_DIR).join(&binary));
        let search = self
            .search_path
            .iter()
            .flat_map(env::split_paths)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(&binary));

        local
            .chain(build)
            .chain(search)
            .find(|candidate| is_executable(candidate))
            .inspect(|path| debug!(path = %path.display(), "Located simulator binary"))
            .ok_or_else(|| {
                SimulationError::BinaryNotFound(format!(
                    "no `{binary}` in the working directory, {SIMULATOR_BUILD_DIR} or PATH; \
                     build it or set {SIMULATOR_PATH_ENV}"
                ))
            })
    }
}

fn checked_override(path: PathBuf, source: &str) -> Result<PathBuf, SimulationError> {
    if path.is_file() {
        debug!(path = %path.display(), source, "Using simulator override");
        Ok(path)
    } else {
        Err(SimulationError::BinaryNotFound(format!(
            "{} from {source} does not exist",
            path.display()
        )))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
