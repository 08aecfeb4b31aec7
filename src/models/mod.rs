pub mod cache;
pub mod driver;
pub mod error;
pub mod interval;
pub mod lap;
pub mod leaderboard;
pub mod meeting;
pub mod result;
pub mod session;
pub mod stats;
pub mod stint;
pub mod telemetry;

pub use driver::Driver;
pub use error::{Error, Result};
pub use interval::{GapValue, Interval};
pub use lap::Lap;
pub use meeting::RaceMeeting;
pub use result::SessionResult;
pub use session::Session;
pub use stint::Stint;
