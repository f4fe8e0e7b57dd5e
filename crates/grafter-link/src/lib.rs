//! in-toto link metadata for Grafeas-backed supply chains.
//!
//! `grafter-link` models the in-toto link record — the signed description of
//! one supply-chain step's materials, products, command, and byproducts —
//! along with local ECDSA signing and a step runner that produces links by
//! executing a command and hashing the artifacts around it.

pub mod error;
pub mod link;
pub mod metablock;
pub mod runlib;
pub mod signer;
