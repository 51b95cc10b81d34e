//! Background Tasks Module
//!
//! Contains background tasks that run alongside a cache.
//!
//! # Tasks
//! - Expired-row reaper: physically deletes records past their expiry at a fixed interval

mod reaper;

pub use reaper::spawn_reaper_task;
