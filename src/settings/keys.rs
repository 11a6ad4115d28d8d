//! Recognized settings and their behavior metadata.
//!
//! The schema is a fixed, ordered table. Order matters: it is the order keys
//! are reported by the reader and the order they appear inside each section
//! of the persisted file.

/// Inbound API secret. Read-only, sourced only from the environment.
pub const AUTH_TOKEN: &str = "KIRO_AUTH_TOKEN";
/// Token clients present to this service. Sensitive but hot-reloadable.
pub const CLIENT_TOKEN: &str = "KIRO_CLIENT_TOKEN";
pub const STEALTH_MODE: &str = "STEALTH_MODE";
pub const HEADER_STRATEGY: &str = "HEADER_STRATEGY";
pub const STEALTH_HTTP2_MODE: &str = "STEALTH_HTTP2_MODE";
pub const PORT: &str = "PORT";
pub const RUNTIME_MODE: &str = "GIN_MODE";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const LOG_CONSOLE: &str = "LOG_CONSOLE";
pub const MAX_TOOL_DESCRIPTION_LENGTH: &str = "MAX_TOOL_DESCRIPTION_LENGTH";

/// When a change to a setting reaches the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Written to the live environment as soon as it is persisted.
    HotReload,
    /// Persisted, but only picked up by the next process start.
    RestartRequired,
    /// Never written by this service.
    Immutable,
}

/// Section of the persisted file a setting is written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Tokens,
    Stealth,
    Service,
    Logging,
    Tooling,
}

impl Category {
    /// All categories in file order.
    pub const ALL: [Category; 5] = [
        Category::Tokens,
        Category::Stealth,
        Category::Service,
        Category::Logging,
        Category::Tooling,
    ];

    /// Comment line that opens the section.
    pub fn label(self) -> &'static str {
        match self {
            Category::Tokens => "# Token configuration",
            Category::Stealth => "# Stealth mode configuration",
            Category::Service => "# Service configuration",
            Category::Logging => "# Logging configuration",
            Category::Tooling => "# Tool configuration",
        }
    }
}

/// A single recognized setting.
#[derive(Debug, Clone, Copy)]
pub struct Setting {
    pub key: &'static str,
    /// Documented default. Empty for the secret, which is never defaulted.
    pub default: &'static str,
    pub mutability: Mutability,
    /// Sensitive values are masked for display and protected from placeholder overwrites.
    pub sensitive: bool,
    pub category: Category,
}

impl Setting {
    const fn new(
        key: &'static str,
        default: &'static str,
        mutability: Mutability,
        category: Category,
    ) -> Self {
        Self {
            key,
            default,
            mutability,
            sensitive: false,
            category,
        }
    }

    const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    /// The immutable secret: carried forward, never accepted from callers.
    pub fn is_secret(&self) -> bool {
        self.mutability == Mutability::Immutable
    }

    /// Sensitive keys callers may change (the client token).
    pub fn is_protected_mutable(&self) -> bool {
        self.sensitive && self.mutability != Mutability::Immutable
    }

    /// Resolve a raw stored value to the value the process actually uses.
    pub fn effective<'a>(&'a self, raw: Option<&'a str>) -> &'a str {
        match raw {
            Some(value) if !value.is_empty() => value,
            _ => self.default,
        }
    }
}

/// Every recognized setting, in report/persist order.
pub static SCHEMA: [Setting; 11] = [
    Setting::new(AUTH_TOKEN, "", Mutability::Immutable, Category::Tokens).sensitive(),
    Setting::new(CLIENT_TOKEN, "", Mutability::HotReload, Category::Tokens).sensitive(),
    Setting::new(STEALTH_MODE, "true", Mutability::HotReload, Category::Stealth),
    Setting::new(HEADER_STRATEGY, "real_simulation", Mutability::HotReload, Category::Stealth),
    Setting::new(STEALTH_HTTP2_MODE, "auto", Mutability::HotReload, Category::Stealth),
    Setting::new(PORT, "8080", Mutability::RestartRequired, Category::Service),
    Setting::new(RUNTIME_MODE, "release", Mutability::RestartRequired, Category::Service),
    Setting::new(LOG_LEVEL, "info", Mutability::HotReload, Category::Logging),
    Setting::new(LOG_FORMAT, "json", Mutability::HotReload, Category::Logging),
    Setting::new(LOG_CONSOLE, "true", Mutability::HotReload, Category::Logging),
    Setting::new(MAX_TOOL_DESCRIPTION_LENGTH, "10000", Mutability::HotReload, Category::Tooling),
];

/// Look up a recognized setting.
pub fn setting(key: &str) -> Option<&'static Setting> {
    SCHEMA.iter().find(|s| s.key == key)
}

/// Documented default for a recognized key.
///
/// `None` means "no default" (the key is unknown), which callers treat as
/// absent rather than as a failure of the whole operation.
pub fn resolve_default(key: &str) -> Option<&'static str> {
    setting(key).map(|s| s.default)
}

/// Settings written under the given section, in schema order.
pub fn in_category(category: Category) -> impl Iterator<Item = &'static Setting> {
    SCHEMA.iter().filter(move |s| s.category == category)
}
