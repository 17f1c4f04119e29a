#![forbid(unsafe_code)]
#![deny(
    warnings,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

pub mod bank;
pub mod context;
pub mod error;
pub mod icq;
pub mod types;
