pub mod abi;
pub mod cli;
pub mod config;
pub mod context;
pub mod contract;
pub mod fetcher;
pub mod forms;
pub mod hooks;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod projection;
pub mod query;
pub mod rpc;
pub mod scheduler;
pub mod submitter;
pub mod views;
