//! Database row types and `kanau` processors for the raffle tables.
//!
//! Rows are the sqlx side of the model. For API/DTO use, see
//! `raffle_sdk::objects`; each row converts into its SDK counterpart.

pub mod participants;
pub mod prizes;
pub mod winners;

/// Postgres placeholder limit is 65535 binds; three binds per seeded row.
pub(crate) const SEED_BATCH_SIZE: usize = 1000;
