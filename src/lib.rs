#![allow(clippy::needless_return)]
#![allow(clippy::len_zero)]
// src/lib.rs

pub mod blockchain;
pub mod cli;
pub mod core;
pub mod nft;
pub mod security;
pub mod storage;
pub mod tools;
