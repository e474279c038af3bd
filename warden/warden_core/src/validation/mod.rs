//! Structural validation helpers.
//!
//! Field-scoped error reporting plus the generic name checks that policy
//! validators build on.

mod field;
mod name;

pub use field::{ErrorList, ErrorType, FieldError, FieldPath};
pub use name::{
    is_dns1123_label, is_dns1123_subdomain, is_qualified_name, is_valid_label_value,
    is_valid_path_segment_name, is_valid_path_segment_prefix,
};
