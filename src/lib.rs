//! LendBarter marketplace backend library
//!
//! Peer-to-peer lending with offer negotiation, repayment proposals,
//! product barter and direct messaging.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod messaging;
pub mod middleware;
pub mod models;
pub mod offer;
pub mod product_offer;
pub mod profile;
pub mod repayment;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
