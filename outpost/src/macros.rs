//! Error-handling macros.

/// Builds an [`crate::error::OutpostError`] and returns it from the current
/// function.
///
/// The optional third argument attaches a detail string, typically the
/// offending input or a rendered underlying error. The macro is fully
/// qualified, so call sites need nothing in scope beyond the
/// [`crate::error::ErrorKind`] they pass.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $message:expr) => {
        return Err($crate::error::OutpostError::new($kind, $message))
    };
    ($kind:expr, $message:expr, $detail:expr) => {
        return Err($crate::error::OutpostError::new($kind, $message).with_detail($detail))
    };
}
