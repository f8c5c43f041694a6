//! The closed set of metric modules a display can show

use super::error::ModuleError;
use super::telemetry::Telemetry;
use chrono::{Local, Timelike};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use tickhud_core::{UserHandle, BYTES_PER_MB};
use tickhud_types::Tier;

/// One metric producer, looked up by its configuration name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Tps,
    Mspt,
    Cpu,
    Memory,
    /// Needs a connected user
    Ping,
    Players,
    Time,
}

static BY_NAME: Lazy<HashMap<&'static str, ModuleKind>> =
    Lazy::new(|| ModuleKind::ALL.iter().map(|kind| (kind.name(), *kind)).collect());

impl ModuleKind {
    pub const ALL: [ModuleKind; 7] = [
        ModuleKind::Tps,
        ModuleKind::Mspt,
        ModuleKind::Cpu,
        ModuleKind::Memory,
        ModuleKind::Ping,
        ModuleKind::Players,
        ModuleKind::Time,
    ];

    /// Name used in module list strings
    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::Tps => "tps",
            ModuleKind::Mspt => "mspt",
            ModuleKind::Cpu => "cpu",
            ModuleKind::Memory => "memory",
            ModuleKind::Ping => "ping",
            ModuleKind::Players => "players",
            ModuleKind::Time => "time",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ModuleError> {
        BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| ModuleError::UnknownModule {
                name: name.to_string(),
                known: Self::ALL.map(|kind| kind.name()).join(", "),
            })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModuleKind::Tps => "TPS",
            ModuleKind::Mspt => "MSPT",
            ModuleKind::Cpu => "CPU",
            ModuleKind::Memory => "RAM",
            ModuleKind::Ping => "Ping",
            ModuleKind::Players => "Online",
            ModuleKind::Time => "Time",
        }
    }

    pub fn needs_user(&self) -> bool {
        matches!(self, ModuleKind::Ping)
    }

    /// Read the current value of this metric
    pub fn produce(&self, telemetry: &Telemetry, user: Option<&dyn UserHandle>) -> ModuleOutput {
        let (value, tier) = match self {
            ModuleKind::Tps => {
                let tps = telemetry.recent_tps().first().copied().unwrap_or(0.0);
                (format!("{:.2}", tps), tps_tier(tps))
            }
            ModuleKind::Mspt => {
                let mspt = telemetry.average_mspt();
                (format!("{:.2}", mspt), mspt_tier(mspt))
            }
            ModuleKind::Cpu => {
                let load = telemetry.recent_cpu_load();
                (format!("{:.2}%, {:.2}%", load.process, load.system), Tier::Good)
            }
            ModuleKind::Memory => match telemetry.memory() {
                Some(usage) => (
                    format!(
                        "{}M/{}M",
                        usage.used_bytes / BYTES_PER_MB,
                        usage.total_bytes / BYTES_PER_MB
                    ),
                    Tier::Good,
                ),
                None => ("?".to_string(), Tier::Low),
            },
            ModuleKind::Ping => match user.and_then(|u| u.ping_ms()) {
                Some(ping) => (ping.to_string(), ping_tier(ping)),
                None => ("?".to_string(), Tier::Low),
            },
            ModuleKind::Players => (
                format!("{}/{}", telemetry.online_users(), telemetry.max_players()),
                Tier::Good,
            ),
            ModuleKind::Time => {
                let now = Local::now();
                (now.format("%H:%M:%S").to_string(), hour_tier(now.hour()))
            }
        };

        ModuleOutput {
            kind: *self,
            label: self.label(),
            value,
            tier,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a comma separated module list; whitespace and empty entries are ignored
pub fn parse_modules(list: &str) -> Result<Vec<ModuleKind>, ModuleError> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ModuleKind::from_name)
        .collect()
}

/// A rendered-to-text metric with its performance tier
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOutput {
    pub kind: ModuleKind,
    pub label: &'static str,
    pub value: String,
    pub tier: Tier,
}

pub fn tps_tier(tps: f64) -> Tier {
    if tps >= 18.5 {
        Tier::Good
    } else if tps > 15.0 {
        Tier::Medium
    } else {
        Tier::Low
    }
}

pub fn mspt_tier(mspt: f64) -> Tier {
    if mspt <= 25.0 {
        Tier::Good
    } else if mspt <= 40.0 {
        Tier::Medium
    } else {
        Tier::Low
    }
}

pub fn ping_tier(ping_ms: u32) -> Tier {
    if ping_ms < 100 {
        Tier::Good
    } else if ping_ms < 250 {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Night hours are low, daytime good, evening medium
fn hour_tier(hour: u32) -> Tier {
    if hour > 22 || hour < 7 {
        Tier::Low
    } else if hour < 16 {
        Tier::Good
    } else {
        Tier::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{telemetry_with, FakeUser};

    #[test]
    fn test_parse_trims_and_skips_empty() {
        let kinds = parse_modules(" tps , mspt,,ping ").unwrap();
        assert_eq!(kinds, vec![ModuleKind::Tps, ModuleKind::Mspt, ModuleKind::Ping]);
        assert!(parse_modules("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        let err = parse_modules("tps,fps").unwrap_err();
        assert!(matches!(err, ModuleError::UnknownModule { ref name, .. } if name == "fps"));
        assert!(err.to_string().contains("players"));
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tps_tier(18.5), Tier::Good);
        assert_eq!(tps_tier(15.01), Tier::Medium);
        assert_eq!(tps_tier(15.0), Tier::Low);
        assert_eq!(mspt_tier(25.0), Tier::Good);
        assert_eq!(mspt_tier(40.0), Tier::Medium);
        assert_eq!(mspt_tier(40.1), Tier::Low);
        assert_eq!(ping_tier(99), Tier::Good);
        assert_eq!(ping_tier(249), Tier::Medium);
        assert_eq!(ping_tier(250), Tier::Low);
        assert_eq!(hour_tier(3), Tier::Low);
        assert_eq!(hour_tier(12), Tier::Good);
        assert_eq!(hour_tier(20), Tier::Medium);
    }

    #[test]
    fn test_produce_values() {
        let telemetry = telemetry_with(vec![19.0, 20.0, 20.0, 20.0], 42.5);
        telemetry.set_max_players(20);
        telemetry.set_online_users(3);
        let user = FakeUser::new();
        user.set_ping(Some(120));

        let tps = ModuleKind::Tps.produce(&telemetry, None);
        assert_eq!((tps.label, tps.value.as_str(), tps.tier), ("TPS", "19.00", Tier::Good));

        let mspt = ModuleKind::Mspt.produce(&telemetry, None);
        assert_eq!((mspt.value.as_str(), mspt.tier), ("42.50", Tier::Low));

        let handle: &dyn UserHandle = user.as_ref();
        let ping = ModuleKind::Ping.produce(&telemetry, Some(handle));
        assert_eq!((ping.value.as_str(), ping.tier), ("120", Tier::Medium));

        let players = ModuleKind::Players.produce(&telemetry, None);
        assert_eq!(players.value, "3/20");
    }
}
