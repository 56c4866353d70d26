//! Secret references in configuration values.
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used verbatim

use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("`pass show {0}` produced no output")]
    PassEmpty(String),

    #[error("environment variable `{0}` is not set")]
    EnvMissing(String),
}

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    if let Some(path) = value.strip_prefix("pass::") {
        from_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var).map_err(|_| SecretError::EnvMissing(var.to_string()))
    } else {
        Ok(value.to_string())
    }
}

fn from_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(resolve("secret").unwrap(), "secret");
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(
            resolve("id.apps.googleusercontent.com").unwrap(),
            "id.apps.googleusercontent.com"
        );
    }

    #[test]
    fn env_reference() {
        unsafe {
            std::env::set_var("_BDAYSYNC_SECRET_TEST", "from-env");
        }
        assert_eq!(resolve("env::_BDAYSYNC_SECRET_TEST").unwrap(), "from-env");
        unsafe {
            std::env::remove_var("_BDAYSYNC_SECRET_TEST");
        }
    }

    #[test]
    fn env_reference_unset() {
        let err = resolve("env::_BDAYSYNC_SURELY_UNSET_98765").unwrap_err();
        assert!(matches!(err, SecretError::EnvMissing(ref v) if v == "_BDAYSYNC_SURELY_UNSET_98765"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_reference_to_missing_entry() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::bdaysync/does/not/exist/98765").is_err());
    }
}
