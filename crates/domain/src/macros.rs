//! Macro for implementing Display and FromStr for tag enums
//!
//! Source tags and calendar types travel as lowercase strings (settings file,
//! UI payloads, log fields). This macro gives each enum one mapping table for
//! both directions.
//!
//! # Example
//!
//! ```rust
//! use daybrief_domain::impl_domain_tag_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Feed {
//!     Native,
//!     Cloud,
//! }
//!
//! impl_domain_tag_conversions!(Feed {
//!     Native => "native",
//!     Cloud => "cloud",
//! });
//! ```

/// Implements Display and FromStr traits for tag enums
///
/// - Display: writes the mapped lowercase string
/// - FromStr: case-insensitive parse, error names the enum
#[macro_export]
macro_rules! impl_domain_tag_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
