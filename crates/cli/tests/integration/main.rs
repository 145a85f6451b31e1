//! End-to-end tests running the koch binary against real build files.

mod command_tests;
