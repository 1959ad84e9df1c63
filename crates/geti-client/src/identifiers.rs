// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Removal of server-assigned identifiers from domain objects.
//!
//! Identifiers and timestamps assigned by the platform must never be sent
//! back when an object is created, so objects read from one project can be
//! uploaded to another only after their identifier fields have been cleared.
//!
//! ```rust
//! use geti_client::{Identifiable, Label, deidentify};
//!
//! let mut label = Label {
//!     id: Some("6372ab".to_string()),
//!     name: "dog".to_string(),
//!     color: "#ff0000ff".to_string(),
//!     group: "default".to_string(),
//!     is_empty: false,
//!     hotkey: None,
//! };
//! assert_eq!(Label::identifier_fields(), &["id"]);
//!
//! deidentify(&mut label);
//! assert_eq!(label.id, None);
//! assert_eq!(label.name, "dog");
//! ```

/// A domain object with a fixed set of server-assigned identifier fields.
///
/// Every identifier field is optional so that it can be cleared.
pub trait Identifiable {
    /// Names of the identifier fields of this type.
    fn identifier_fields() -> &'static [&'static str];

    /// Clears the identifier field `field`. Returns false if `field` is not
    /// an identifier field of this type.
    fn clear_identifier(&mut self, field: &str) -> bool;
}

/// Clears every identifier field of `instance` in place.
///
/// Only the fields of `instance` itself are cleared; nested domain objects
/// keep theirs. Calling it twice has the same effect as calling it once.
pub fn deidentify<T: Identifiable>(instance: &mut T) {
    for field in T::identifier_fields() {
        if !instance.clear_identifier(field) {
            log::warn!("identifier field '{}' could not be cleared", field);
        }
    }
}

/// Implements [`Identifiable`] for a struct whose listed fields are all
/// `Option`s.
macro_rules! identifier_fields {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::identifiers::Identifiable for $ty {
            fn identifier_fields() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn clear_identifier(&mut self, field: &str) -> bool {
                $(
                    if field == stringify!($field) {
                        self.$field = None;
                        return true;
                    }
                )+
                false
            }
        }
    };
}

pub(crate) use identifier_fields;
