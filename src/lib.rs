//! Client for the CoolMasterNet HVAC bridge's line-oriented TCP control protocol.
//!
//! ```no_run
//! # async fn run() -> coolmasternet::Result<()> {
//! use coolmasternet::{Bridge, BridgeConfig};
//!
//! let bridge = Bridge::new(BridgeConfig::new("192.168.1.20").with_swing_support(true));
//!
//! for (id, unit) in bridge.status().await? {
//!     if !unit.is_on() {
//!         let unit = unit.turn_on().await?;
//!         println!("{id}: {unit}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod emulator;
pub mod error;
pub mod protocol;
pub mod unit;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use protocol::iu::{LockTarget, Mode, SwingMode, TemperatureUnit};
pub use unit::Unit;
