//! Integration tests for the Flash Stellar SDK.
//!
//! ## Test Categories
//!
//! - **behavioral**: pipeline scenarios run against an in-memory RPC node

mod behavioral;
