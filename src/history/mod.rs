//! History — dated iterations, the provenance journal, BLAKE3 content hashes,
//! and drift between the live definition and its snapshots.

pub mod drift;
pub mod hasher;
pub mod iterations;
pub mod journal;
