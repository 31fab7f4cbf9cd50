//! Emulator for a bridge and the indoor units behind it.
//!
//! Speaks the same prompt-delimited protocol as a real bridge, so the
//! client can be exercised without hardware.

use std::{collections::BTreeMap, io, sync::Arc};

use futures::StreamExt;
use tokio::{io::AsyncWriteExt, net::{TcpListener, TcpStream}, sync::Mutex};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info, warn};

use crate::protocol::{
    codec::{LINE_SEPARATOR, PROMPT, SUCCESS_MARKER},
    iu::{LockTarget, Mode, SwingMode, TemperatureUnit},
};

const MAX_LINE_LENGTH: usize = 256;

const UNIT_NOT_FOUND: &str = "Unit Not Found";
const UNKNOWN_COMMAND: &str = "Unknown Command";
const INVALID_VALUE: &str = "Invalid Value";
const UNSUPPORTED_FEATURE: &str = "Unsupported Feature";


#[derive(Clone, Debug, PartialEq)]
pub struct EmulatedUnit {
    pub is_on: bool,
    pub temperature_unit: TemperatureUnit,
    pub thermostat: f64,
    pub temperature: f64,
    pub fan_speed: String,
    pub mode: Mode,
    pub error_code: Option<String>,
    pub clean_filter: bool,
    pub demand: bool,

    /// `None` for units without louvers; swing commands are then unsupported.
    pub swing: Option<SwingMode>,

    pub locks: Vec<LockTarget>,
}

impl Default for EmulatedUnit {
    fn default() -> Self {
        Self {
            is_on: false,
            temperature_unit: TemperatureUnit::Celsius,
            thermostat: 24.0,
            temperature: 25.0,
            fan_speed: "low".to_string(),
            mode: Mode::Cool,
            error_code: None,
            clean_filter: false,
            demand: false,
            swing: Some(SwingMode::Auto),
            locks: Vec::new(),
        }
    }
}

impl EmulatedUnit {
    /// Render the `ls2` status line for this unit.
    pub fn status_line(&self, unit_id: &str) -> String {
        format!(
            "{unit_id} {:<3} {} {} {:<4} {:<5} {} {} {}",
            if self.is_on { "ON" } else { "OFF" },
            self.temperature_unit.format(self.thermostat),
            self.temperature_unit.format(self.temperature),
            capitalize(&self.fan_speed),
            capitalize(self.mode.as_ref()),
            self.error_code.as_deref().unwrap_or("OK"),
            if self.clean_filter { '#' } else { '-' },
            if self.demand { '1' } else { '0' },
        )
    }

    fn apply(&mut self, command: &str, args: &[&str]) -> String {
        match (command, args) {
            ("query", ["s"]) => match self.swing {
                Some(swing) => ok([swing.code().to_string()]),
                None => fail(UNSUPPORTED_FEATURE),
            },
            ("on", []) => {
                self.is_on = true;
                done()
            },
            ("off", []) => {
                self.is_on = false;
                done()
            },
            ("fspeed", [speed]) => {
                self.fan_speed = speed.to_lowercase();
                done()
            },
            ("temp", [value]) => match value.parse::<f64>() {
                Ok(value) => {
                    self.thermostat = (value * 10.0).round() / 10.0;
                    done()
                },
                Err(_) => fail(INVALID_VALUE),
            },
            ("feed", [value]) => match value.parse::<f64>() {
                Ok(value) => {
                    self.temperature = value;
                    done()
                },
                Err(_) => fail(INVALID_VALUE),
            },
            ("swing", [code]) => match (self.swing, SwingMode::from_code(code)) {
                (None, _) => fail(UNSUPPORTED_FEATURE),
                (Some(_), Some(swing)) => {
                    self.swing = Some(swing);
                    done()
                },
                (Some(_), None) => fail(INVALID_VALUE),
            },
            ("filt", []) => {
                self.clean_filter = false;
                done()
            },
            ("lock", [lock]) => {
                let mut chars = lock.chars();
                let (sign, target) = (chars.next(), chars.next().and_then(LockTarget::from_code));

                match (sign, target, chars.next()) {
                    (Some('+'), Some(target), None) => {
                        if !self.locks.contains(&target) {
                            self.locks.push(target);
                        }
                        done()
                    },
                    (Some('-'), Some(target), None) => {
                        self.locks.retain(|lock| *lock != target);
                        done()
                    },
                    _ => fail(INVALID_VALUE),
                }
            },
            (mode, []) => match mode.parse::<Mode>() {
                Ok(mode) => {
                    self.mode = mode;
                    done()
                },
                Err(_) => fail(UNKNOWN_COMMAND),
            },
            _ => fail(UNKNOWN_COMMAND),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Successful reply carrying `lines`.
fn ok<I: IntoIterator<Item = String>>(lines: I) -> String {
    let mut reply = String::new();
    for line in lines {
        reply.push_str(&line);
        reply.push_str(LINE_SEPARATOR);
    }
    reply.push_str(SUCCESS_MARKER);
    reply.push(PROMPT as char);
    reply
}

/// Successful reply without a body.
fn done() -> String {
    format!("{SUCCESS_MARKER}{}", PROMPT as char)
}

fn fail(message: &str) -> String {
    format!("{message}{LINE_SEPARATOR}{}", PROMPT as char)
}


/// An emulated bridge. Clones share the same units.
#[derive(Clone, Debug)]
pub struct Emulator {
    units: Arc<Mutex<BTreeMap<String, EmulatedUnit>>>,
    info: Arc<Vec<(String, String)>>,
}

impl Emulator {
    pub fn new<I, S>(units: I) -> Self where
        I: IntoIterator<Item = (S, EmulatedUnit)>,
        S: Into<String>
    {
        let units: BTreeMap<String, EmulatedUnit> = units.into_iter()
            .map(|(id, unit)| (id.into(), unit))
            .collect();

        let info = vec![
            ("Version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
            ("Units".to_string(), units.len().to_string()),
        ];

        Self {
            units: Arc::new(Mutex::new(units)),
            info: Arc::new(info),
        }
    }

    /// Add a line to the `set` reply.
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.info).push((key.into(), value.into()));
        self
    }

    /// Current state of an emulated unit.
    pub async fn unit(&self, unit_id: &str) -> Option<EmulatedUnit> {
        self.units.lock().await.get(unit_id).cloned()
    }

    /// Execute one command line, returning the full reply including the trailing prompt.
    pub async fn execute(&self, line: &str) -> String {
        let words: Vec<&str> = line.split_whitespace().collect();

        let Some((&command, args)) = words.split_first() else {
            return (PROMPT as char).to_string();
        };

        let mut units = self.units.lock().await;

        match (command, args) {
            ("set", []) => ok(self.info.iter().map(|(key, value)| format!("{key}: {value}"))),
            ("ls2", []) => ok(units.iter().map(|(id, unit)| unit.status_line(id))),
            ("ls2", [id]) => match units.get(*id) {
                Some(unit) => ok([unit.status_line(id)]),
                None => fail(UNIT_NOT_FOUND),
            },
            (_, [id, args @ ..]) => match units.get_mut(*id) {
                Some(unit) => unit.apply(command, args),
                None => fail(UNIT_NOT_FOUND),
            },
            _ => fail(UNKNOWN_COMMAND),
        }
    }

    /// Accept bridge clients forever.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (socket, addr) = listener.accept().await?;

            socket.set_nodelay(true)?;

            info!(%addr, "bridge client connected");

            let emulator = self.clone();
            tokio::spawn(async move {
                if let Err(err) = emulator.session(socket).await {
                    warn!(%addr, %err, "bridge client session failed");
                }
            });
        }
    }

    async fn session(self, socket: TcpStream) -> io::Result<()> {
        let (rx, mut tx) = socket.into_split();
        let mut lines = FramedRead::new(rx, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

        tx.write_all(&[PROMPT]).await?;

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "unreadable command line, closing session");
                    break;
                }
            };

            debug!(%line, "emulator command");

            let reply = self.execute(&line).await;
            tx.write_all(reply.as_bytes()).await?;
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn emulator() -> Emulator {
        Emulator::new([
            ("L1.100", EmulatedUnit::default()),
            ("L1.101", EmulatedUnit { swing: None, error_code: Some("U4".to_string()), ..Default::default() }),
        ])
    }

    #[test]
    fn test_status_line() {
        let unit = EmulatedUnit { is_on: true, fan_speed: "med".to_string(), clean_filter: true, ..Default::default() };

        assert_eq!(unit.status_line("L1.100"), "L1.100 ON  024.0C 025.0C Med  Cool  OK # 0");
    }

    #[tokio::test]
    async fn test_listing() {
        let emulator = emulator();

        assert_eq!(
            emulator.execute("ls2").await,
            "L1.100 OFF 024.0C 025.0C Low  Cool  OK - 0\r\nL1.101 OFF 024.0C 025.0C Low  Cool  U4 - 0\r\nOK\r\n>"
        );
        assert_eq!(emulator.execute("ls2 L9.999").await, "Unit Not Found\r\n>");
        assert_eq!(emulator.execute("set").await, format!("Version: {}\r\nUnits: 2\r\nOK\r\n>", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_mutations() {
        let emulator = emulator();

        for line in ["on L1.100", "heat L1.100", "fspeed L1.100 High", "temp L1.100 21.25", "lock L1.100 +t", "swing L1.100 v"] {
            assert_eq!(emulator.execute(line).await, "OK\r\n>", "{line}");
        }

        let unit = emulator.unit("L1.100").await.unwrap();
        assert!(unit.is_on);
        assert_eq!(unit.mode, Mode::Heat);
        assert_eq!(unit.fan_speed, "high");
        assert_eq!(unit.thermostat, 21.3);
        assert_eq!(unit.locks, vec![LockTarget::Thermostat]);
        assert_eq!(unit.swing, Some(SwingMode::Vertical));

        assert_eq!(emulator.execute("query L1.100 s").await, "v\r\nOK\r\n>");
    }

    #[tokio::test]
    async fn test_failures() {
        let emulator = emulator();

        assert_eq!(emulator.execute("swing L1.101 h").await, "Unsupported Feature\r\n>");
        assert_eq!(emulator.execute("query L1.101 s").await, "Unsupported Feature\r\n>");
        assert_eq!(emulator.execute("turbo L1.100").await, "Unknown Command\r\n>");
        assert_eq!(emulator.execute("temp L1.100 warm").await, "Invalid Value\r\n>");
        assert_eq!(emulator.execute("lock L1.100 *o").await, "Invalid Value\r\n>");
        assert_eq!(emulator.execute("on L9.999").await, "Unit Not Found\r\n>");
        assert_eq!(emulator.execute("").await, ">");
    }
}
