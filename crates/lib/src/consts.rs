//! Shared constants for the builder.

/// Tool name, used in banners and manifest output.
pub const TOOL_NAME: &str = "mrmsbuild";

pub const MAJOR_VERSION: u32 = 1;
pub const MINOR_VERSION: u32 = 1;

/// Config file read when the user does not name one.
pub const DEFAULT_CONFIG_FILE: &str = "default.cfg";

/// Repository root used when the config file does not override it
/// with a `REPOSITORY` key.
pub const DEFAULT_SVN_ROOT: &str = "svn+ssh://mrmssvn/svnroot";

/// Checkout directory names under the target, one per build group.
pub const THIRDPARTY_DIR: &str = "3rdParty";
pub const WDSS2_DIR: &str = "WDSS2";
pub const HYDRO_DIR: &str = "HMET";
pub const WG2_DIR: &str = "WG2";

/// Full tool version string, e.g. "1.1".
pub fn version() -> String {
  format!("{}.{}", MAJOR_VERSION, MINOR_VERSION)
}
