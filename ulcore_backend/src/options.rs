//! Bit-flag arguments: scan options, discovery interfaces, event masks.
//!
//! Several driver flags share a value (`DWORDXFER`/`SIMULTANEOUS`, `WORDXFER`/`CTR32BIT`); the
//! meaning depends on the function receiving them, exactly as in the driver headers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Options word of the scan functions (`a_in_scan` and friends).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScanOptions: i32 {
        const FOREGROUND = 0x0;
        const BACKGROUND = 0x1;
        const CONTINUOUS = 0x2;
        const EXTCLOCK = 0x4;
        const CONVERTDATA = 0x8;
        const SCALEDATA = 0x10;
        const SINGLEIO = 0x20;
        const DMAIO = 0x40;
        const BLOCKIO = 0x60;
        const WORDXFER = 0x100;
        const DWORDXFER = 0x200;
        const SIMULTANEOUS = 0x200;
        const BURSTMODE = 0x1000;
        const EXTTRIGGER = 0x4000;
        const NOCALIBRATEDATA = 0x8000;
        const BURSTIO = 0x10000;
        const RETRIGMODE = 0x20000;
        const NONSTREAMEDIO = 0x40000;
        const ADCCLOCKTRIG = 0x80000;
        const ADCCLOCK = 0x100000;
        const HIGHRESRATE = 0x200000;
        const SHUNTCAL = 0x400000;
        const CTR32BIT = 0x100;
        const CTR48BIT = 0x200;
        const CTR64BIT = 0x400;
        const NOCLEAR = 0x800;
    }
}

impl ScanOptions {
    /// Options accepted by the simulated scan engine; anything else is rejected with `BADOPTION`.
    pub const SIMULATED: ScanOptions = ScanOptions::BACKGROUND
        .union(ScanOptions::CONTINUOUS)
        .union(ScanOptions::CONVERTDATA)
        .union(ScanOptions::BLOCKIO)
        .union(ScanOptions::NOCALIBRATEDATA);

    /// Splits a driver options word into the individually named flags it contains.
    ///
    /// The first name wins for shared values, and zero-valued flags are skipped.
    pub fn flag_list(self) -> Vec<ScanOptions> {
        let mut seen = ScanOptions::empty();
        let mut out = Vec::new();
        for (_, flag) in ScanOptions::all().iter_names() {
            if flag.is_empty() || seen.contains(flag) || !self.contains(flag) {
                continue;
            }
            seen |= flag;
            out.push(flag);
        }
        out
    }
}

bitflags! {
    /// Interfaces searched by device discovery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InterfaceType: u32 {
        const USB = 1;
        const BLUETOOTH = 2;
        const ETHERNET = 4;
        const ANY = 7;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EventType: u32 {
        const ON_SCAN_ERROR = 0x1;
        const ON_EXTERNAL_INTERRUPT = 0x2;
        const ON_PRETRIGGER = 0x4;
        const ON_DATA_AVAILABLE = 0x8;
        const ON_END_OF_AI_SCAN = 0x10;
        const ON_END_OF_AO_SCAN = 0x20;
        const ON_CHANGE_DI = 0x40;
        const ALL_EVENT_TYPES = 0xffff;
    }
}

impl EventType {
    /// The individual events, without the `ALL_EVENT_TYPES` mask.
    pub fn singles() -> Vec<EventType> {
        EventType::all()
            .iter_names()
            .map(|(_, event)| event)
            .filter(|event| event.bits().count_ones() == 1)
            .collect()
    }
}

bitflags! {
    /// Options of `v_in`/`v_out`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VInOptions: i32 {
        const DEFAULT = 0x0;
    }
}

bitflags! {
    /// Options of `t_in`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TInOptions: i32 {
        const NOFILTER = 0x400;
        const WAITFORNEWDATA = 0x2000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_values() {
        assert_eq!(ScanOptions::DWORDXFER.bits(), ScanOptions::SIMULTANEOUS.bits());
        assert_eq!(ScanOptions::BLOCKIO, ScanOptions::SINGLEIO | ScanOptions::DMAIO);
    }

    #[test]
    fn test_flag_list() {
        let opts = ScanOptions::BACKGROUND | ScanOptions::CONTINUOUS | ScanOptions::EXTTRIGGER;
        assert_eq!(
            opts.flag_list(),
            vec![ScanOptions::BACKGROUND, ScanOptions::CONTINUOUS, ScanOptions::EXTTRIGGER]
        );
        assert!(ScanOptions::FOREGROUND.flag_list().is_empty());
    }

    #[test]
    fn test_simulated_options() {
        assert!(ScanOptions::SIMULATED.contains(ScanOptions::BACKGROUND | ScanOptions::CONTINUOUS));
        assert!(!ScanOptions::SIMULATED.contains(ScanOptions::EXTCLOCK));
    }

    #[test]
    fn test_event_singles() {
        let singles = EventType::singles();
        assert_eq!(singles.len(), 7);
        assert_eq!(singles[0], EventType::ON_SCAN_ERROR);
        assert!(!singles.contains(&EventType::ALL_EVENT_TYPES));
    }

    #[test]
    fn test_interface_any() {
        assert!(InterfaceType::ANY.contains(InterfaceType::USB | InterfaceType::ETHERNET));
    }
}
