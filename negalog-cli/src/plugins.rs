//! Exec-based plugin support.
//!
//! Plugins are separate binaries named `negalog-<command>` that are
//! discovered and executed when an unknown subcommand is invoked, following
//! the same pattern kubectl and git use. The plugin inherits stdin, stdout
//! and stderr, and its exit code is propagated.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Search for a plugin binary named `negalog-<command>`.
///
/// Locations, in order:
///  1. Same directory as the negalog binary
///  2. `~/.negalog/plugins/`
///  3. Anywhere in `PATH`
pub fn find_plugin(command: &str) -> Option<PathBuf> {
    let plugin_name = format!("negalog-{command}");

    // 1. Same directory as the negalog binary
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(&plugin_name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }

    // 2. ~/.negalog/plugins/
    if let Some(home) = std::env::var_os("HOME") {
        let candidate = PathBuf::from(home).join(".negalog/plugins").join(&plugin_name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }

    // 3. PATH
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(&plugin_name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

/// Run a plugin with the given arguments and return its exit code.
///
/// Stdin, stdout and stderr are inherited from the current process.
pub fn execute(plugin_path: &Path, args: &[String]) -> i32 {
    match Command::new(plugin_path).args(args).status() {
        // Terminated by signal on Unix yields no code
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("Error executing plugin {}: {e}", plugin_path.display());
            1
        }
    }
}

/// Build a helpful error message for an unresolvable command.
pub fn not_found_message(command: &str) -> String {
    format!(
        "unknown command \"{command}\" for \"negalog\"\n\
         \n\
         If this is a plugin, install the binary as one of:\n\
         \x20 - negalog-{command} in the same directory as negalog\n\
         \x20 - ~/.negalog/plugins/negalog-{command}\n\
         \x20 - negalog-{command} anywhere in your PATH\n\
         \n\
         Run 'negalog --help' for usage."
    )
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
