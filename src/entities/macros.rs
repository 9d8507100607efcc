//! Macros for reducing boilerplate when defining entities
//!
//! Every entity kind has its own identifier newtype so that a foreign key
//! pointing at a `User` cannot be handed to a lookup expecting a `Post`.

/// Macro to declare a string-backed identifier type for an entity kind
///
/// Generates a transparent newtype around `String` with:
/// - `new()` from any string-like value
/// - `generate()` producing a random UUID v4 identifier
/// - `as_str()`, `AsRef<str>` and `Display`
/// - `From<&str>` and `From<String>`
///
/// # Example
/// ```rust,ignore
/// impl_entity_id!(
///     /// Identifier of a tag
///     TagId
/// );
///
/// let id = TagId::generate();
/// assert_eq!(id.as_str().len(), 36);
/// ```
#[macro_export]
macro_rules! impl_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier (UUID v4)
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    impl_entity_id!(
        /// Identifier used only by these tests
        SampleId
    );

    #[test]
    fn test_generate_produces_distinct_ids() {
        let a = SampleId::generate();
        let b = SampleId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = SampleId::new("abc123");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("abc123"));

        let back: SampleId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_and_from() {
        let id: SampleId = "42".into();
        assert_eq!(id.to_string(), "42");
        assert_eq!(SampleId::from(String::from("42")), id);
    }
}
