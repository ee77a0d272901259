pub mod audit;
pub mod auth;
pub mod crud;
pub mod search;
pub mod task;
pub mod user;

#[cfg(test)]
mod test_util;
