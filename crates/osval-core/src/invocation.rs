//! A single external command to execute.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One environment assignment layered on top of the inherited environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvOverride {
    pub key: String,
    pub value: String,
}

/// An external program, its ordered arguments, and at most one extra
/// environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name, resolved through `PATH`.
    pub program: String,

    /// Arguments in the order they are passed.
    pub args: Vec<String>,

    /// Optional environment override for this invocation only.
    pub env: Option<EnvOverride>,
}

impl Invocation {
    /// Create an invocation with no arguments and no environment override.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Attach the single environment override.
    ///
    /// Calling this twice replaces the previous override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env = Some(EnvOverride {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Build the child's environment from `inherited`.
    ///
    /// Every inherited entry is kept as-is. The override, if any, is added as
    /// one more entry, or replaces the entry of the same key.
    pub fn environment<I, K, V>(&self, inherited: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env: BTreeMap<String, String> = inherited
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if let Some(over) = &self.env {
            env.insert(over.key.clone(), over.value.clone());
        }
        env
    }

    /// Program followed by its arguments, for logging.
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(env) = &self.env {
            write!(f, "{}={} ", env.key, env.value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> Vec<(String, String)> {
        vec![
            ("PATH".to_string(), "/usr/bin:/bin".to_string()),
            ("LANG".to_string(), "C.UTF-8".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]
    }

    #[test]
    fn test_args_keep_order() {
        let inv = Invocation::new("yum").args(["-y", "install", "httpd"]);
        assert_eq!(inv.program, "yum");
        assert_eq!(inv.args, vec!["-y", "install", "httpd"]);
        assert!(inv.env.is_none());
    }

    #[test]
    fn test_environment_without_override_is_inherited() {
        let inv = Invocation::new("apk").args(["update"]);
        let env = inv.environment(base_env());
        assert_eq!(env.len(), 3);
        for (k, v) in base_env() {
            assert_eq!(env.get(&k), Some(&v));
        }
    }

    #[test]
    fn test_with_env_appends_exactly_one_entry() {
        let inv = Invocation::new("apt-get")
            .args(["update"])
            .with_env("DEBIAN_FRONTEND", "noninteractive");
        let env = inv.environment(base_env());

        assert_eq!(env.len(), base_env().len() + 1);
        assert_eq!(
            env.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
        for (k, v) in base_env() {
            assert_eq!(env.get(&k), Some(&v), "inherited {} changed", k);
        }
    }

    #[test]
    fn test_with_env_replaces_existing_key_only() {
        let mut inherited = base_env();
        inherited.push(("DEBIAN_FRONTEND".to_string(), "dialog".to_string()));

        let inv = Invocation::new("apt-get").with_env("DEBIAN_FRONTEND", "noninteractive");
        let env = inv.environment(inherited.clone());

        assert_eq!(env.len(), inherited.len());
        assert_eq!(env["DEBIAN_FRONTEND"], "noninteractive");
        assert_eq!(env["PATH"], "/usr/bin:/bin");
    }

    #[test]
    fn test_environment_does_not_touch_process_env() {
        let inv = Invocation::new("true").with_env("OSVAL_TEST_UNSET_MARKER", "1");
        let _ = inv.environment(std::env::vars());
        assert!(std::env::var("OSVAL_TEST_UNSET_MARKER").is_err());
    }

    #[test]
    fn test_display_includes_env_prefix() {
        let inv = Invocation::new("apt-get")
            .args(["install", "-q", "-y", "fortune-mod"])
            .with_env("DEBIAN_FRONTEND", "noninteractive");
        assert_eq!(
            inv.command_line(),
            "DEBIAN_FRONTEND=noninteractive apt-get install -q -y fortune-mod"
        );
    }
}
