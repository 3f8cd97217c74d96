//! Notification delta and dispatch
//!
//! Each fetch of the notification page is compared against the set of ids
//! seen before. Unseen items are handed to a [`NotificationScheduler`]
//! once, in page order. Read state is app-local: it lives beside the
//! cached content and is joined onto every fresh fetch, so a refresh never
//! resurrects an item the user already read.

pub mod center;
pub mod scheduler;

pub use center::{NotificationCenter, NotificationSource, NotificationState};
pub use scheduler::{
    CommandScheduler, LogScheduler, NotificationContent, NotificationScheduler, Priority,
};
