pub mod generate;
pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub use parse::{load_config, parse_config, validate_config, ConfigError};
pub use types::Config;

/// Matches `$env{VAR_NAME}` where VAR_NAME starts with a letter or underscore
pub(crate) static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// Substitute `$env{NAME}` references with the variable's value.
/// Unset variables stay as written so validation can report them.
pub fn expand_env_vars(text: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

/// Replace a leading `~` with the home directory, when one is known
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Pick the config file for this invocation: `--config` if given, else the
/// first of `~/.config/loggen/config.yml` and `/etc/loggen/config.yml` that exists.
///
/// `None` means no file was found and the built-in defaults apply.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/loggen/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// ~/.config/loggen/config.yml, if the home directory is known
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/loggen/config.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_env_var_substituted() {
        std::env::set_var("LOGGEN_TEST_OUT_DIR", "/srv/logs");
        let result = expand_env_vars("$env{LOGGEN_TEST_OUT_DIR}/server.log");
        assert_eq!(result, "/srv/logs/server.log");
        std::env::remove_var("LOGGEN_TEST_OUT_DIR");
    }

    #[test]
    fn test_unset_env_var_kept() {
        let text = "$env{LOGGEN_SURELY_UNSET}/server.log";
        assert_eq!(expand_env_vars(text), text);
    }

    #[test]
    fn test_text_without_references() {
        assert_eq!(expand_env_vars("server_1gb.log"), "server_1gb.log");
    }

    #[test]
    fn test_tilde_prefix() {
        match dirs::home_dir() {
            Some(home) => assert_eq!(expand_tilde(Path::new("~/logs/out.log")), home.join("logs/out.log")),
            None => assert_eq!(expand_tilde(Path::new("~/logs/out.log")), Path::new("~/logs/out.log")),
        }
    }

    #[test]
    fn test_paths_without_tilde() {
        for path in ["/var/log/server.log", "out/server.log", "a~b.log"] {
            assert_eq!(expand_tilde(Path::new(path)), Path::new(path));
        }
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let resolved = resolve_config_path(Some(Path::new("/tmp/custom.yml")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/custom.yml")));
    }
}
