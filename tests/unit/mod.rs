//! Unit tests for individual components

mod context_test;
mod error_test;
mod fair_index_test;
mod runtime_test;
mod util_test;
