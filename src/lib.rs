//! portalsync - Portal Synchronization Engine
//!
//! Authenticated access to a legacy ASP.NET university portal through a
//! remote proxy, typed extraction of its HTML pages, a TTL cache with
//! stale-while-revalidate reads, and notification delta tracking.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod notify;
pub mod portal;
pub mod proxy;
pub mod session;
pub mod store;
pub mod ui;

pub use error::{PortalError, PortalResult};
pub use portal::Portal;
