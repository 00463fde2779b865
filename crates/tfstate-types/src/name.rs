//! Validated string identifiers.
//!
//! Workspace names and operation ids both end up inside blob paths, so they
//! are restricted to a path-safe alphabet:
//! - Must be non-empty and at most [`MAX_IDENTIFIER_LEN`] bytes
//! - Only ASCII letters, digits, `.`, `_` and `-`
//! - Must not be `.` or `..`
//!
//! Workspace names additionally exclude [`RESERVED_WORKSPACE_NAMES`], which
//! the HTTP service answers itself.
//!
//! Lock tokens are opaque: any non-empty string without control characters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest accepted identifier, matching the width of the metadata columns.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Names that collide with the service's own top-level endpoints.
pub const RESERVED_WORKSPACE_NAMES: [&str; 2] = ["health", "info"];

fn invalid(kind: &'static str, value: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn check_length(kind: &'static str, value: &str) -> Result<(), TypeError> {
    if value.is_empty() {
        return Err(invalid(kind, value, "must not be empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid(
            kind,
            value,
            format!("longer than {MAX_IDENTIFIER_LEN} bytes"),
        ));
    }
    Ok(())
}

fn validate_path_segment(kind: &'static str, value: &str) -> Result<(), TypeError> {
    check_length(kind, value)?;

    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(invalid(kind, value, format!("contains forbidden character: {ch:?}")));
    }

    if value == "." || value == ".." {
        return Err(invalid(kind, value, "must not be '.' or '..'"));
    }

    Ok(())
}

fn validate_workspace_name(kind: &'static str, value: &str) -> Result<(), TypeError> {
    validate_path_segment(kind, value)?;
    if RESERVED_WORKSPACE_NAMES.contains(&value) {
        return Err(invalid(kind, value, "is reserved by the service"));
    }
    Ok(())
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $validate:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a string.
            pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
                let value = value.into();
                ($validate)($kind, value.as_str())?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }
    };
}

string_identifier!(
    /// Unique name of a workspace, the unit of independently locked state.
    WorkspaceName,
    "workspace name",
    validate_workspace_name
);

string_identifier!(
    /// Caller-supplied correlation token attached to a save.
    ///
    /// Not a deduplication key: saving the same bytes under two operation ids
    /// records two versions.
    OperationId,
    "operation id",
    validate_path_segment
);

string_identifier!(
    /// Opaque lock token chosen by the client; must match on unlock.
    LockToken,
    "lock token",
    |kind, value: &str| {
        check_length(kind, value)?;
        if value.chars().any(char::is_control) {
            return Err(invalid(kind, value, "contains control characters"));
        }
        Ok::<(), TypeError>(())
    }
);
