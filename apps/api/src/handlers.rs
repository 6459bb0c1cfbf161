pub mod counts;
pub mod cron;
pub mod hashtag;
pub mod health;
