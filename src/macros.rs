//! Struct-update macros for the configuration types, so call sites keep compiling as
//! fields are added.

/// Builds [`crate::Options`] from `Default` plus the listed fields.
///
/// ```rust
/// let options = saphyr_wire::options! {
///     strict_booleans: false,
///     merge_keys: false,
/// };
/// assert!(!options.merge_keys);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $( opt.$field = $value; )*
        opt
    }};
}

/// Builds [`crate::Budget`] from `Default` plus the listed fields.
///
/// ```rust
/// let budget = saphyr_wire::budget! { max_documents: 1 };
/// assert_eq!(budget.max_documents, 1);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $( budget.$field = $value; )*
        budget
    }};
}
