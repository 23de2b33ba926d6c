//! Unit tests for the marketplace adapters.

mod yandex_tests;
