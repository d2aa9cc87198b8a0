pub use folio_utils_derive::trace_instrument;

mod macros;

/// Returns the version of this build.
pub fn folio_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
