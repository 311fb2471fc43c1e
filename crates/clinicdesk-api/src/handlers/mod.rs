//! Request handlers

pub mod health;
pub mod receipts;
pub mod sharing;
pub mod visits;
