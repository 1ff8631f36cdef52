//! Testing utilities
//!
//! Grammar fixtures shared by unit and integration tests.
//!
//! Tests must pull grammars from [`fixtures`] instead of writing ad-hoc
//! grammar text inline. A slightly-off grammar makes a test assert the
//! wrong thing, and scattering near-duplicates across test files makes
//! every grammar-shape change a hunt. One vetted copy of each shape,
//! used everywhere, keeps the suite honest.

pub mod fixtures;
