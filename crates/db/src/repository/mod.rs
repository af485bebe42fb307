//! Repository functions, one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic, no domain types. Pure SQL.

pub mod news;
pub mod schedules;

#[cfg(test)]
mod tests;
