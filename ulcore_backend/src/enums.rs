//! Integer-valued enumerations passed to and returned from the driver.
//!
//! Each enum carries its driver code (`code()`) and converts back with `from_code`. The
//! `TryFrom<i32>` conversions fail with a [`UlError`] whose code depends on the enum: item
//! selectors report `BADCONFIGITEM`. Enums with a dedicated driver code use it (`BADCONFIGTYPE`
//! for `InfoType`, `BADPORTNUM`, `BADTEMPSCALE`, `BADTRIGTYPE`); the rest report `BADOPTION`.
//!
//! Members that the driver defines as aliases of another member (`AUXPORT0`, `FIRSTPORTCL`,
//! `DACSTARTUP`) are exposed as associated constants.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorCode, UlError};

macro_rules! ul_enum {
    (
        $(#[$meta:meta])*
        pub enum $enum:ident ($err:ident) {
            $($name:ident = $code:expr,)*
        }
    ) => {
        $(#[$meta])*
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $enum {
            $($name = $code,)*
        }

        impl $enum {
            pub const ALL: &'static [$enum] = &[$($enum::$name,)*];

            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($enum::$name => stringify!($name),)*
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                Self::ALL.iter().copied().find(|item| item.code() == code)
            }
        }

        impl TryFrom<i32> for $enum {
            type Error = UlError;

            fn try_from(code: i32) -> Result<Self, Self::Error> {
                Self::from_code(code).ok_or_else(|| {
                    UlError::with_context(ErrorCode::$err, format!("{} code {}", stringify!($enum), code))
                })
            }
        }

        impl fmt::Display for $enum {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }

        impl FromStr for $enum {
            type Err = UlError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|item| item.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        UlError::with_context(ErrorCode::$err, format!("unknown {} '{}'", stringify!($enum), s))
                    })
            }
        }

        impl Serialize for $enum {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $enum {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = String::deserialize(deserializer)?;
                name.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

ul_enum! {
    /// Selects the table that `get_config`/`set_config` read from.
    pub enum InfoType(BADCONFIGTYPE) {
        GLOBALINFO = 1,
        BOARDINFO = 2,
        DIGITALINFO = 3,
        COUNTERINFO = 4,
        EXPANSIONINFO = 5,
        EXPINFOARRAY = 7,
    }
}

ul_enum! {
    pub enum GlobalInfo(BADCONFIGITEM) {
        VERSION = 36,
        NUMBOARDS = 38,
        NUMEXPBOARDS = 40,
        TRACEFLAGS = 42,
        INIT = 44,
    }
}

ul_enum! {
    /// Items of the `BOARDINFO` configuration table.
    pub enum BoardInfo(BADCONFIGITEM) {
        BASEADR = 0,
        BOARDTYPE = 1,
        INTLEVEL = 2,
        DMACHAN = 3,
        INITIALIZED = 4,
        CLOCK = 5,
        RANGE = 6,
        NUMADCHANS = 7,
        USESEXPS = 8,
        DINUMDEVS = 9,
        DIDEVNUM = 10,
        CINUMDEVS = 11,
        CIDEVNUM = 12,
        NUMDACHANS = 13,
        WAITSTATE = 14,
        NUMIOPORTS = 15,
        PARENTBOARD = 16,
        DTBOARD = 17,
        NUMEXPS = 18,
        NOITEM = 99,
        DACSAMPLEHOLD = 100,
        DIOENABLE = 101,
        CTR0SRC = 104,
        CTR1SRC = 105,
        CTR2SRC = 106,
        PACERCTR0SRC = 107,
        DAC0VREF = 108,
        DAC1VREF = 109,
        INTP2LEVEL = 110,
        WAITSTATEP2 = 111,
        ADPOLARITY = 112,
        TRIGEDGE = 113,
        DACRANGE = 114,
        DACUPDATE = 115,
        DACINSTALLED = 116,
        ADCFG = 117,
        ADINPUTMODE = 118,
        DACPOLARITY = 119,
        TEMPMODE = 120,
        TEMPREJFREQ = 121,
        DISOFILTER = 122,
        INT32SRC = 123,
        INT32PRIORITY = 124,
        MEMSIZE = 125,
        MEMCOUNT = 126,
        PRNPORT = 127,
        PRNDELAY = 128,
        PPIODIO = 129,
        CTR3SRC = 130,
        CTR4SRC = 131,
        CTR5SRC = 132,
        CTRINTSRC = 133,
        CTRLINKING = 134,
        SBX0BOARDNUM = 135,
        SBX0ADDRESS = 136,
        SBX0DMACHAN = 137,
        SBX0INTLEVEL0 = 138,
        SBX0INTLEVEL1 = 139,
        SBX1BOARDNUM = 140,
        SBX1ADDRESS = 141,
        SBX1DMACHAN = 142,
        SBX1INTLEVEL0 = 143,
        SBX1INTLEVEL1 = 144,
        SBXBUSWIDTH = 145,
        CALFACTOR1 = 146,
        CALFACTOR2 = 147,
        DACTRIG = 148,
        CHANCFG = 149,
        PROTOCOL = 150,
        COMADDR2 = 151,
        CTSRTS1 = 152,
        CTSRTS2 = 153,
        CTRLLINES = 154,
        WAITSTATEP1 = 155,
        INTP1LEVEL = 156,
        CTR6SRC = 157,
        CTR7SRC = 158,
        CTR8SRC = 159,
        CTR9SRC = 160,
        CTR10SRC = 161,
        CTR11SRC = 162,
        CTR12SRC = 163,
        CTR13SRC = 164,
        CTR14SRC = 165,
        TCGLOBALAVG = 166,
        TCCJCSTATE = 167,
        TCCHANRANGE = 168,
        TCCHANTYPE = 169,
        FWVERSION = 170,
        PHACFG = 180,
        PHBCFG = 190,
        INDEXCFG = 200,
        SLOTNUM = 201,
        AIWAVETYPE = 202,
        PWRUPSTATE = 203,
        IRQCONNECT = 204,
        TRIGPOLARITY = 205,
        CTLRNUM = 206,
        PWRJMPR = 207,
        NUMTEMPCHANS = 208,
        ADTRIGSRC = 209,
        BNCSRC = 210,
        BNCTHRESHOLD = 211,
        BURSTMODE = 212,
        DITHERON = 213,
        SERIALNUM = 214,
        DACUPDATEMODE = 215,
        DACUPDATECMD = 216,
        DACRESTORE = 217,
        ACCOUPLED = 218,
        ADTRIGCOUNT = 219,
        ADFIFOSIZE = 220,
        ADSOURCE = 221,
        CALOUTPUT = 222,
        SRCADPACER = 223,
        MFGSERIALNUM = 224,
        PCIREVID = 225,
        BOARDTEMP = 226,
        EXTCLKTYPE = 227,
        RELAYLOGIC = 228,
        OPENRELAYLEVEL = 229,
        DIALARMMASK = 230,
        DEFAULTIP = 231,
        CURRENTIP = 232,
        DHCPENABLED = 233,
        CURRENTPORT = 234,
        TEMPSENSORTYPE = 235,
        TEMPCONNECTIONTYPE = 236,
        TEMPEXCITATION = 237,
        TEMPCHANGAIN = 238,
        OWNERNAME = 239,
        OWNERIP = 240,
        TBASERES = 241,
        TEMPCALIBRATE = 242,
        CURRENTGATEWAYIP = 243,
        DEFAULTGATEWAYIP = 244,
        CURRENTSUBNET = 245,
        DEFAULTSUBNET = 246,
        NETIOTIMEOUT = 247,
        NETMINPORT = 248,
        ADCHANAIMODE = 249,
        DACFORCESENSE = 250,
        SYNCMODE = 251,
        ADCPACEROUT = 252,
        DACPACEROUT = 253,
        CALTABLETYPE = 254,
        DIDEBOUNCESTATE = 255,
        DIDEBOUNCETIME = 256,
        BUSNUM = 257,
        PANID = 258,
        RFCHANNEL = 259,
        POWERLEVEL = 260,
        RSS = 261,
        NODEID = 262,
        DEVNOTES = 263,
        PROGRAMDEV = 264,
        INTEDGE = 265,
        RFCHANENERGY = 266,
        ADCCALIBRATE = 267,
        ADCCALSTEPS = 268,
        TEMPCALSTEPS = 269,
        ADCSETTLETIME = 270,
        WEBSERVERENABLE = 271,
        FACTORYID = 272,
        HTTPPORT = 273,
        HIDELOGINDLG = 274,
        ACTUALDAQSCANRATE = 275,
        USBQUERY = 276,
        DACXFERPRIMECOUNT = 277,
        EXTPOWERSTATE = 278,
        CHANBWMODE = 279,
        TEMPSCALE = 280,
        CALDACVREF = 281,
        DACCALVOLT = 282,
        USERADCSETTLETIME = 283,
        DACTRIGCOUNT = 284,
        ADTIMINGMODE = 285,
        RTDCHANTYPE = 286,
        TERMINALCOUNTSTATUSENABLE = 287,
        ATRIGCALIBRATE = 288,
        ADEXCITATION = 289,
        ADBRIDGETYPE = 290,
        ADRES = 291,
        DACRES = 292,
        CALTIMEOUT = 293,
        ADLOADCALCOEFS = 294,
        DACLOADCALCOEFS = 295,
        CLOCKTIME = 296,
        BUTTONSTATE = 297,
        INTERFACEPATH = 298,
        DACCALIBRATE = 299,
        ATRIGRANGE = 300,
        LEDPATTERN = 301,
        ADCAVGCOUNT = 302,
        DEVINST = 303,
        DIFILTERTIME = 304,
        DISTATERETENTION = 305,
        ADXFERMODE = 306,
        CTRTRIGCOUNT = 307,
        DAQITRIGCOUNT = 308,
        HASEXTINFO = 309,
        NUMIODEVS = 310,
        IODEVTYPE = 311,
        ADNUMCHANMODES = 312,
        ADCHANMODE = 313,
        ADNUMDIFFRANGES = 314,
        ADDIFFRANGE = 315,
        ADNUMSERANGES = 316,
        ADSERANGE = 317,
        ADNUMTRIGTYPES = 318,
        ADTRIGTYPE = 319,
        ADMAXRATE = 320,
        ADMAXTHROUGHPUT = 321,
        ADMAXBURSTRATE = 322,
        ADMAXBURSTTHROUGHPUT = 323,
        ADHASPACER = 324,
        ADCHANTYPES = 325,
        ADSCANOPTIONS = 326,
        ADMAXSEQUEUELENGTH = 327,
        ADMAXDIFFQUEUELENGTH = 328,
        ADQUEUETYPES = 329,
        ADQUEUELIMITS = 330,
        DACHASPACER = 331,
        DACSCANOPTIONS = 332,
        DACFIFOSIZE = 333,
        DACNUMRANGES = 334,
        DACDEVRANGE = 335,
        DACNUMTRIGTYPES = 336,
        DACTRIGTYPE = 337,
        DAQAMISUPPORTED = 338,
        DISCONNECT = 340,
        NETCONNECTCODE = 341,
        CONNECTED = 342,
        DITRIGCOUNT = 343,
        DOTRIGCOUNT = 344,
        PATTERNTRIGPORT = 345,
        CHANTCTYPE = 347,
        EXTINPACEREDGE = 348,
        EXTOUTPACEREDGE = 349,
        INPUTPACEROUT = 350,
        OUTPUTPACEROUT = 351,
        TEMPAVG = 352,
        EXCITATION = 353,
        CHANBRIDGETYPE = 354,
        ADCHANTYPE = 355,
        CHANRTDTYPE = 356,
        DEVUNIQUEID = 357,
        USERDEVID = 358,
        DEVVERSION = 359,
        TERMCOUNTSTATBIT = 360,
        DETECTOPENTC = 361,
        ADDATARATE = 362,
        DEVSERIALNUM = 363,
        DEVMACADDR = 364,
        USERDEVIDNUM = 365,
        NETBIOSNAME = 366,
        DISCANOPTIONS = 367,
        DOSCANOPTIONS = 368,
        CTRSCANOPTIONS = 369,
        DAQISCANOPTIONS = 370,
        DAQOSCANOPTIONS = 371,
        DEVCLASS = 372,
        ADAIMODE = 373,
        DEVIPADDR = 374,
        DACDISABLERESTORE = 375,
        DAQINUMCHANTYPES = 376,
        DAQICHANTYPE = 377,
        DAQONUMCHANTYPES = 378,
        DAQOCHANTYPE = 379,    }
}

impl BoardInfo {
    pub const DACSTARTUP: BoardInfo = BoardInfo::DACRESTORE;
}

ul_enum! {
    /// Items of the `DIGITALINFO` configuration table (one entry per digital device).
    pub enum DigitalInfo(BADCONFIGITEM) {
        BASEADR = 0,
        INITIALIZED = 1,
        DEVTYPE = 2,
        MASK = 3,
        READWRITE = 4,
        CONFIG = 5,
        NUMBITS = 6,
        CURVAL = 7,
        INMASK = 8,
        OUTMASK = 9,
        INITPORTVAL = 10,
        HASPACER = 11,
        PORTIOTYPE = 12,
        DISABLEDIRCHECK = 13,
    }
}

ul_enum! {
    pub enum CounterInfo(BADCONFIGITEM) {
        BASEADR = 0,
        INITIALIZED = 1,
        CTRTYPE = 2,
        CTRNUM = 3,
        CONFIGBYTE = 4,
    }
}

ul_enum! {
    pub enum ExpansionInfo(BADCONFIGITEM) {
        BOARDTYPE = 0,
        MUX_AD_CHAN1 = 1,
        MUX_AD_CHAN2 = 2,
        RANGE1 = 3,
        RANGE2 = 4,
        CJCCHAN = 5,
        THERMTYPE = 6,
        NUMEXPCHANS = 7,
        PARENTBOARD = 8,
        SPARE0 = 9,
        FIVEVOLTSOURCE = 100,
        CHANCONFIG = 101,
        VSOURCE = 102,
        VSELECT = 103,
    }
}

ul_enum! {
    /// Subsystem a background operation belongs to.
    pub enum FunctionType(BADOPTION) {
        AIFUNCTION = 1,
        AOFUNCTION = 2,
        DIFUNCTION = 3,
        DOFUNCTION = 4,
        CTRFUNCTION = 5,
        DAQIFUNCTION = 6,
        DAQOFUNCTION = 7,
    }
}

ul_enum! {
    pub enum Status(BADOPTION) {
        IDLE = 0,
        RUNNING = 1,
    }
}

ul_enum! {
    pub enum DigitalPortType(BADPORTNUM) {
        AUXPORT = 1,
        AUXPORT1 = 2,
        AUXPORT2 = 3,
        FIRSTPORTA = 10,
        FIRSTPORTB = 11,
        FIRSTPORTC = 12,
        FIRSTPORTCH = 13,
        SECONDPORTA = 14,
        SECONDPORTB = 15,
        SECONDPORTCL = 16,
        SECONDPORTCH = 17,
        THIRDPORTA = 18,
        THIRDPORTB = 19,
        THIRDPORTCL = 20,
        THIRDPORTCH = 21,
        FOURTHPORTA = 22,
        FOURTHPORTB = 23,
        FOURTHPORTCL = 24,
        FOURTHPORTCH = 25,
        FIFTHPORTA = 26,
        FIFTHPORTB = 27,
        FIFTHPORTCL = 28,
        FIFTHPORTCH = 29,
        SIXTHPORTA = 30,
        SIXTHPORTB = 31,
        SIXTHPORTCL = 32,
        SIXTHPORTCH = 33,
        SEVENTHPORTA = 34,
        SEVENTHPORTB = 35,
        SEVENTHPORTCL = 36,
        SEVENTHPORTCH = 37,
        EIGHTHPORTA = 38,
        EIGHTHPORTB = 39,
        EIGHTHPORTCL = 40,
        EIGHTHPORTCH = 41,
    }
}

impl DigitalPortType {
    pub const AUXPORT0: DigitalPortType = DigitalPortType::AUXPORT;
    pub const FIRSTPORTCL: DigitalPortType = DigitalPortType::FIRSTPORTC;

    /// Auxiliary ports are bit-configurable; the 8255-style ports are configured per port.
    pub fn is_aux(self) -> bool {
        matches!(
            self,
            DigitalPortType::AUXPORT | DigitalPortType::AUXPORT1 | DigitalPortType::AUXPORT2
        )
    }
}

ul_enum! {
    pub enum DigitalIODirection(BADOPTION) {
        OUT = 1,
        IN = 2,
    }
}

ul_enum! {
    pub enum TempScale(BADTEMPSCALE) {
        CELSIUS = 0,
        FAHRENHEIT = 1,
        KELVIN = 2,
        VOLTS = 4,
        NOSCALE = 5,
    }
}

ul_enum! {
    pub enum TrigType(BADTRIGTYPE) {
        TRIG_ABOVE = 0,
        TRIG_BELOW = 1,
        GATE_NEG_HYS = 2,
        GATE_POS_HYS = 3,
        GATE_ABOVE = 4,
        GATE_BELOW = 5,
        GATE_IN_WINDOW = 6,
        GATE_OUT_WINDOW = 7,
        GATE_HIGH = 8,
        GATE_LOW = 9,
        TRIG_HIGH = 10,
        TRIG_LOW = 11,
        TRIG_POS_EDGE = 12,
        TRIG_NEG_EDGE = 13,
        TRIG_RISING = 14,
        TRIG_FALLING = 15,
        TRIG_PATTERN_EQ = 16,
        TRIG_PATTERN_NE = 17,
        TRIG_PATTERN_ABOVE = 18,
        TRIG_PATTERN_BELOW = 19,
    }
}

ul_enum! {
    pub enum AnalogInputMode(BADOPTION) {
        DIFFERENTIAL = 0,
        SINGLE_ENDED = 1,
        GROUNDED = 16,
    }
}

ul_enum! {
    pub enum CounterChannelType(BADOPTION) {
        CTR8254 = 1,
        CTR9513 = 2,
        CTR8536 = 3,
        CTR7266 = 4,
        CTREVENT = 5,
        CTRSCAN = 6,
        CTRTMR = 7,
        CTRQUAD = 8,
        CTRPULSE = 9,
    }
}

ul_enum! {
    /// Channel kinds a DAQ input or output scan can mix.
    pub enum ChannelType(BADOPTION) {
        ANALOG = 0,
        DIGITAL8 = 1,
        DIGITAL16 = 2,
        CTR16 = 3,
        CTR32LOW = 4,
        CTR32HIGH = 5,
        CJC = 6,
        TC = 7,
        ANALOG_SE = 8,
        ANALOG_DIFF = 9,
        SETPOINTSTATUS = 10,
        CTRBANK0 = 11,
        CTRBANK1 = 12,
        CTRBANK2 = 13,
        CTRBANK3 = 14,
        PADZERO = 15,
        DIGITAL = 16,
        CTR = 17,
    }
}

ul_enum! {
    /// What the driver prints on its own when a call fails.
    pub enum ErrorReporting(BADOPTION) {
        DONTPRINT = 0,
        PRINTWARNINGS = 1,
        PRINTFATAL = 2,
        PRINTALL = 3,
    }
}

ul_enum! {
    /// Whether the driver aborts the process when a call fails.
    pub enum ErrorHandling(BADOPTION) {
        DONTSTOP = 0,
        STOPFATAL = 1,
        STOPALL = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_info_codes() {
        assert_eq!(BoardInfo::BOARDTYPE.code(), 1);
        assert_eq!(BoardInfo::RANGE.code(), 6);
        assert_eq!(BoardInfo::NUMADCHANS.code(), 7);
        assert_eq!(BoardInfo::ADRES.code(), 291);
        assert_eq!(BoardInfo::DEVUNIQUEID.code(), 357);
        assert_eq!(BoardInfo::DACSTARTUP, BoardInfo::DACRESTORE);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(DigitalPortType::AUXPORT0.code(), 1);
        assert_eq!(DigitalPortType::FIRSTPORTCL.code(), 12);
        assert_eq!(DigitalPortType::EIGHTHPORTCH.code(), 41);
        assert!(DigitalPortType::AUXPORT1.is_aux());
        assert!(!DigitalPortType::FIRSTPORTA.is_aux());
    }

    #[test]
    fn test_unknown_code_errors() {
        let err = BoardInfo::try_from(-42).unwrap_err();
        assert!(err.is(ErrorCode::BADCONFIGITEM));
        let err = DigitalPortType::try_from(5).unwrap_err();
        assert!(err.is(ErrorCode::BADPORTNUM));
        assert_eq!(TrigType::try_from(12).unwrap(), TrigType::TRIG_POS_EDGE);
        assert!(InfoType::try_from(6).unwrap_err().is(ErrorCode::BADCONFIGTYPE));
        assert!(ChannelType::try_from(18).unwrap_err().is(ErrorCode::BADOPTION));
    }

    #[test]
    fn test_parse_by_name() {
        assert_eq!("firstporta".parse::<DigitalPortType>().unwrap(), DigitalPortType::FIRSTPORTA);
        assert_eq!(" AIFUNCTION ".parse::<FunctionType>().unwrap(), FunctionType::AIFUNCTION);
        assert!("SIDEWAYS".parse::<DigitalIODirection>().is_err());
    }
}
