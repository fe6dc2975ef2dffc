//! Macro for string-backed enums
//!
//! Several configuration enums travel as short lowercase tokens (for example
//! `check-sso` in identity init options). This macro implements `Display`
//! and case-insensitive `FromStr` for them from a single mapping table.
//!
//! # Example
//!
//! ```rust
//! use dictators_domain::impl_str_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Flow {
//!     Standard,
//!     Implicit,
//! }
//!
//! impl_str_enum_conversions!(Flow {
//!     Standard => "standard",
//!     Implicit => "implicit",
//! });
//!
//! assert_eq!("IMPLICIT".parse::<Flow>().unwrap(), Flow::Implicit);
//! ```

/// Implements `Display` and `FromStr` for a fieldless enum
///
/// Parsing trims surrounding whitespace and ignores case. The error names
/// the enum and echoes the rejected input.
#[macro_export]
macro_rules! impl_str_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation of this variant
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        CheckSso,
        LoginRequired,
    }

    impl_str_enum_conversions!(Mode {
        CheckSso => "check-sso",
        LoginRequired => "login-required",
    });

    #[test]
    fn test_display_uses_wire_form() {
        assert_eq!(Mode::CheckSso.to_string(), "check-sso");
        assert_eq!(Mode::LoginRequired.as_str(), "login-required");
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(Mode::from_str(" Check-SSO ").unwrap(), Mode::CheckSso);
        assert_eq!(Mode::from_str("LOGIN-REQUIRED").unwrap(), Mode::LoginRequired);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = Mode::from_str("silent").unwrap_err();
        assert!(err.contains("Mode"));
        assert!(err.contains("silent"));
    }
}
