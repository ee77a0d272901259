pub mod auth;
pub mod logs;
pub mod rest;
pub mod swagger_main;
pub mod task;
pub mod user;

#[cfg(test)]
pub mod test_util;
