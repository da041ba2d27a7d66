//! Cross-module pipeline tests.

mod pipeline_test;
