//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings for backward compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Opaque application identifier, assigned at registration time.
    AppId
);

string_newtype!(
    /// Human-readable application key, unique across the store.
    AppSlug
);

string_newtype!(
    /// Identifier of a downstream cluster an application deploys to.
    ClusterId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_display_and_as_ref() {
        let id = AppId::new("app_1234");
        assert_eq!(id.to_string(), "app_1234");
        assert_eq!(id.as_str(), "app_1234");
        assert_eq!(AsRef::<str>::as_ref(&id), "app_1234");
    }

    #[test]
    fn app_slug_serde_roundtrip() {
        let slug = AppSlug::new("my-app");
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, "\"my-app\"");
        let back: AppSlug = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slug);
    }

    #[test]
    fn cluster_id_from_str() {
        let cid = ClusterId::from("cluster-eu-1");
        assert_eq!(cid.as_str(), "cluster-eu-1");
    }

    #[test]
    fn app_id_into_inner() {
        let id = AppId::new("app_x".to_owned());
        assert_eq!(id.into_inner(), "app_x");
    }

    #[test]
    fn string_comparisons() {
        let slug = AppSlug::new("svc");
        assert!(slug == *"svc");
        assert!(slug == "svc".to_owned());
        assert!("svc".to_owned() == slug);
    }
}
