pub mod rss;
pub mod scripted;
