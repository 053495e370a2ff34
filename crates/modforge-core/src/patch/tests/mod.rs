mod chain_tests;
mod session_tests;
