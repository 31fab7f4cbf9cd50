//! Immutable unit snapshots.
//!
//! A [`Unit`] is the state of one indoor unit at the moment it was fetched.
//! Mutators never change a snapshot: they send a command to the bridge and
//! return a freshly fetched [`Unit`].

use std::fmt::{self, Display};

use crate::{
    bridge::Bridge,
    error::{Error, Result},
    protocol::{
        commands::Request,
        iu::{LockTarget, Mode, SwingMode, TemperatureUnit},
        status::UnitStatus,
    },
};

/// Reply prefix when a unit lacks a requested feature.
const UNSUPPORTED_FEATURE: &str = "Unsupported Feature";


#[derive(Clone, Debug)]
pub struct Unit {
    bridge: Bridge,
    unit_id: String,
    status: UnitStatus,
    swing: Option<SwingMode>,
}

impl Unit {
    /// Fetch (or parse) a unit snapshot.
    ///
    /// Without a pre-fetched `raw` status line, the unit is listed with
    /// `ls2 {id}`. With swing support enabled the swing mode is queried too.
    pub async fn create(bridge: Bridge, unit_id: &str, raw: Option<String>) -> Result<Self> {
        let raw = match raw {
            Some(raw) => raw,
            None => bridge.request(Request::ListUnit(unit_id)).await?.trim().to_string(),
        };

        let swing_raw = if bridge.config().swing_support {
            bridge.request(Request::QuerySwing(unit_id)).await?.trim().to_string()
        } else {
            String::new()
        };

        Self::parse(bridge, unit_id, &raw, &swing_raw)
    }

    fn parse(bridge: Bridge, unit_id: &str, raw: &str, swing_raw: &str) -> Result<Self> {
        let status = UnitStatus::parse(raw)?;
        let swing = SwingMode::from_code(swing_raw);

        Ok(Self {
            bridge,
            unit_id: unit_id.to_string(),
            status,
            swing,
        })
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn status(&self) -> &UnitStatus {
        &self.status
    }

    pub fn is_on(&self) -> bool {
        self.status.is_on
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.status.temperature_unit
    }

    /// Target temperature.
    pub fn thermostat(&self) -> f64 {
        self.status.thermostat
    }

    /// Current room temperature.
    pub fn temperature(&self) -> f64 {
        self.status.temperature
    }

    pub fn fan_speed(&self) -> &str {
        &self.status.fan_speed
    }

    pub fn mode(&self) -> Mode {
        self.status.mode
    }

    /// Error code on error, otherwise `None`.
    pub fn error_code(&self) -> Option<&str> {
        self.status.error_code.as_deref()
    }

    /// The air filter needs cleaning.
    pub fn clean_filter(&self) -> bool {
        self.status.clean_filter
    }

    /// The unit is demanding compressor ON.
    pub fn demand(&self) -> bool {
        self.status.demand
    }

    /// Current swing mode. Always `None` when swing support is disabled.
    pub fn swing(&self) -> Option<SwingMode> {
        self.swing
    }

    /// Fetch the current state as a new snapshot.
    pub async fn refresh(&self) -> Result<Unit> {
        Unit::create(self.bridge.clone(), &self.unit_id, None).await
    }

    /// Send a command and return the refreshed unit.
    async fn command(&self, request: Request<'_>) -> Result<Unit> {
        self.bridge.request(request).await?;
        self.refresh().await
    }

    pub async fn turn_on(&self) -> Result<Unit> {
        self.command(Request::TurnOn(&self.unit_id)).await
    }

    pub async fn turn_off(&self) -> Result<Unit> {
        self.command(Request::TurnOff(&self.unit_id)).await
    }

    pub async fn set_fan_speed(&self, speed: &str) -> Result<Unit> {
        self.command(Request::SetFanSpeed { unit: &self.unit_id, speed }).await
    }

    /// Fails with [`Error::Validation`] before touching the wire if `mode`
    /// is not one of auto, cool, dry, fan or heat.
    pub async fn set_mode(&self, mode: &str) -> Result<Unit> {
        let mode = Mode::parse_arg(mode)?;

        self.command(Request::SetMode { unit: &self.unit_id, mode }).await
    }

    /// The value is sent as given; the bridge works in tenths of a degree.
    pub async fn set_thermostat(&self, value: f64) -> Result<Unit> {
        self.command(Request::SetThermostat { unit: &self.unit_id, value }).await
    }

    /// Unknown swing names fail before touching the wire. If the bridge
    /// replies `Unsupported Feature`, fails without refreshing.
    pub async fn set_swing(&self, swing: &str) -> Result<Unit> {
        let swing = SwingMode::parse_arg(swing)?;

        let response = self.bridge.request(Request::SetSwing { unit: &self.unit_id, swing }).await?;
        if response.trim_start().starts_with(UNSUPPORTED_FEATURE) {
            return Err(Error::Validation(format!(
                "Unit {} doesn't support swing mode {swing}.", self.unit_id
            )));
        }

        self.refresh().await
    }

    /// Report that the air filter was cleaned and reset its timer.
    pub async fn reset_filter(&self) -> Result<Unit> {
        self.command(Request::ResetFilter(&self.unit_id)).await
    }

    async fn lock(&self, target: LockTarget, locked: bool) -> Result<Unit> {
        self.command(Request::Lock { unit: &self.unit_id, target, locked }).await
    }

    /// Lock the unit's on/off button.
    pub async fn lock_on(&self) -> Result<Unit> {
        self.lock(LockTarget::Power, true).await
    }

    pub async fn unlock_on(&self) -> Result<Unit> {
        self.lock(LockTarget::Power, false).await
    }

    pub async fn lock_temp(&self) -> Result<Unit> {
        self.lock(LockTarget::Thermostat, true).await
    }

    pub async fn unlock_temp(&self) -> Result<Unit> {
        self.lock(LockTarget::Thermostat, false).await
    }

    pub async fn lock_mode(&self) -> Result<Unit> {
        self.lock(LockTarget::Mode, true).await
    }

    pub async fn unlock_mode(&self) -> Result<Unit> {
        self.lock(LockTarget::Mode, false).await
    }

    /// Provide an ambient temperature hint to the unit.
    ///
    /// Fire-and-forget: no refresh is performed.
    pub async fn feed(&self, value: f64) -> Result<()> {
        self.bridge.request(Request::Feed { unit: &self.unit_id, value }).await?;

        Ok(())
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = &self.status;
        let unit = status.temperature_unit;

        write!(
            f,
            "{} {} {} set {} now {} fan {}",
            self.unit_id,
            if status.is_on { "on" } else { "off" },
            status.mode,
            unit.format(status.thermostat),
            unit.format(status.temperature),
            status.fan_speed,
        )?;

        if let Some(swing) = self.swing {
            write!(f, " swing {swing}")?;
        }
        if let Some(error_code) = &status.error_code {
            write!(f, " error {error_code}")?;
        }
        if status.clean_filter {
            write!(f, " clean-filter")?;
        }
        if status.demand {
            write!(f, " demand")?;
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use crate::config::BridgeConfig;

    use super::*;

    /// A bridge nothing listens on: any wire request fails with a connectivity error.
    fn unreachable_bridge() -> Bridge {
        Bridge::new(BridgeConfig::new("127.0.0.1").with_port(1))
    }

    fn unit() -> Unit {
        Unit::parse(unreachable_bridge(), "IEF001", " IEF001 ON    021.0C 023.5C Med  Cool  OK - 0", "h").unwrap()
    }

    #[test]
    fn test_snapshot_fields() {
        let unit = unit();

        assert_eq!(unit.unit_id(), "IEF001");
        assert!(unit.is_on());
        assert_eq!(unit.thermostat(), 21.0);
        assert_eq!(unit.temperature(), 23.5);
        assert_eq!(unit.fan_speed(), "med");
        assert_eq!(unit.mode(), Mode::Cool);
        assert_eq!(unit.error_code(), None);
        assert!(!unit.clean_filter());
        assert!(!unit.demand());
        assert_eq!(unit.swing(), Some(SwingMode::Horizontal));
    }

    #[test]
    fn test_display() {
        assert_eq!(unit().to_string(), "IEF001 on cool set 021.0C now 023.5C fan med swing horizontal");
    }

    #[tokio::test]
    async fn test_set_mode_rejected_before_wire() {
        let err = unit().set_mode("turbo").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_set_swing_rejected_before_wire() {
        let err = unit().set_swing("sideways").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_valid_mode_reaches_wire() {
        let err = unit().set_mode("heat").await.unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)), "{err:?}");
    }
}
