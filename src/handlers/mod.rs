pub mod leaderboard;
pub mod meetings;
pub mod session;
pub mod stats;
pub mod strategy;
pub mod telemetry;
