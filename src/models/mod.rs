pub mod appointment;
pub mod catalog;
pub mod common;
pub mod requests;
pub mod review;
pub mod schedule;
