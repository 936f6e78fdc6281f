//! Bulk sender: spreadsheet-driven message dispatch through a web
//! messaging client, with an admin kill switch.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod input;
pub mod remote;
pub mod report;
pub mod session;
