//! Configuration for the [`Forge`](crate::Forge) engine

use mixforge_core::TypeKey;

/// Engine settings.
///
/// Defaults match the behavior of the standalone engine functions: builtin
/// atomic types registered, compact JSON, deep search and deep
/// transformation enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeConfig {
    /// Register the builtin atomic types (None, bool, int, float, str, bytes,
    /// date, datetime, uuid, path, Enum, type, callable)
    pub register_builtin_atomics: bool,

    /// Additional atomic types, by `module:Name` tag
    pub extra_atomic_types: Vec<TypeKey>,

    /// Indent JSON produced by `dumps`
    pub pretty_json: bool,

    /// `find` keeps searching inside matches
    pub deep_search: bool,

    /// `transform` reconstructs the inside of replacements
    pub deep_transformation: bool,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            register_builtin_atomics: true,
            extra_atomic_types: Vec::new(),
            pretty_json: false,
            deep_search: true,
            deep_transformation: true,
        }
    }
}

impl ForgeConfig {
    /// Set whether builtin atomic types are registered.
    pub fn with_builtin_atomics(mut self, enabled: bool) -> Self {
        self.register_builtin_atomics = enabled;
        self
    }

    /// Add an atomic type tag.
    pub fn with_atomic_type(mut self, key: TypeKey) -> Self {
        self.extra_atomic_types.push(key);
        self
    }

    /// Set pretty JSON output.
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    /// Set the default `deep_search` for `find`.
    pub fn with_deep_search(mut self, deep: bool) -> Self {
        self.deep_search = deep;
        self
    }

    /// Set the default `deep_transformation` for `transform`.
    pub fn with_deep_transformation(mut self, deep: bool) -> Self {
        self.deep_transformation = deep;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first, if present.
    /// This will look for:
    /// - `MIXFORGE_PRETTY_JSON`
    /// - `MIXFORGE_DEEP_SEARCH`
    /// - `MIXFORGE_DEEP_TRANSFORMATION`
    /// - `MIXFORGE_BUILTIN_ATOMICS`
    /// - `MIXFORGE_ATOMIC_TYPES`, a comma-separated list of `module:Name` tags
    ///
    /// Flags accept `1/true/yes/on` and `0/false/no/off`; other values are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a malformed atomic type tag.
    #[cfg(feature = "env")]
    pub fn from_env() -> crate::Result<Self> {
        use std::env;

        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(pretty) = env_flag("MIXFORGE_PRETTY_JSON") {
            config.pretty_json = pretty;
        }
        if let Some(deep) = env_flag("MIXFORGE_DEEP_SEARCH") {
            config.deep_search = deep;
        }
        if let Some(deep) = env_flag("MIXFORGE_DEEP_TRANSFORMATION") {
            config.deep_transformation = deep;
        }
        if let Some(builtins) = env_flag("MIXFORGE_BUILTIN_ATOMICS") {
            config.register_builtin_atomics = builtins;
        }

        if let Ok(tags) = env::var("MIXFORGE_ATOMIC_TYPES") {
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let key = TypeKey::parse(tag).map_err(|e| {
                    crate::Error::Config(format!("MIXFORGE_ATOMIC_TYPES entry '{tag}': {e}"))
                })?;
                config.extra_atomic_types.push(key);
            }
        }

        Ok(config)
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Settings of `other` left at their default do not override; atomic
    /// type lists are concatenated.
    pub fn merge(mut self, other: ForgeConfig) -> Self {
        let defaults = Self::default();
        if other.register_builtin_atomics != defaults.register_builtin_atomics {
            self.register_builtin_atomics = other.register_builtin_atomics;
        }
        for key in other.extra_atomic_types {
            if !self.extra_atomic_types.contains(&key) {
                self.extra_atomic_types.push(key);
            }
        }
        if other.pretty_json != defaults.pretty_json {
            self.pretty_json = other.pretty_json;
        }
        if other.deep_search != defaults.deep_search {
            self.deep_search = other.deep_search;
        }
        if other.deep_transformation != defaults.deep_transformation {
            self.deep_transformation = other.deep_transformation;
        }
        self
    }
}

#[cfg(feature = "env")]
fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
