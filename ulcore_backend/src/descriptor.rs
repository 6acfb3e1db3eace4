//! Description of a discoverable device, in owned and native (`#[repr(C)]`) form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::options::InterfaceType;

const NAME_LEN: usize = 64;
const RESERVED_LEN: usize = 512;

/// A device found by inventory, before or after it is bound to a board number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaqDeviceDescriptor {
    pub product_name: String,
    pub product_id: u32,
    pub interface_type: u32,
    pub dev_string: String,
    pub unique_id: String,
    pub nuid: u64,
}

impl DaqDeviceDescriptor {
    pub fn interface(&self) -> InterfaceType {
        InterfaceType::from_bits_truncate(self.interface_type)
    }

    pub fn to_native(&self) -> NativeDescriptor {
        let mut native = NativeDescriptor::zeroed();
        write_c_string(&mut native.product_name, &self.product_name);
        native.product_id = self.product_id;
        native.interface_type = self.interface_type;
        write_c_string(&mut native.dev_string, &self.dev_string);
        write_c_string(&mut native.unique_id, &self.unique_id);
        native.nuid = self.nuid;
        native
    }
}

impl fmt::Display for DaqDeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.dev_string.is_empty() {
            write!(f, "{}", self.product_name)
        } else {
            write!(f, "{}", self.dev_string)
        }
    }
}

/// Memory layout of the driver's `DaqDeviceDescriptor` struct.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct NativeDescriptor {
    pub product_name: [u8; NAME_LEN],
    pub product_id: u32,
    pub interface_type: u32,
    pub dev_string: [u8; NAME_LEN],
    pub unique_id: [u8; NAME_LEN],
    pub nuid: u64,
    pub reserved: [u8; RESERVED_LEN],
}

impl NativeDescriptor {
    pub fn zeroed() -> Self {
        Self {
            product_name: [0; NAME_LEN],
            product_id: 0,
            interface_type: 0,
            dev_string: [0; NAME_LEN],
            unique_id: [0; NAME_LEN],
            nuid: 0,
            reserved: [0; RESERVED_LEN],
        }
    }
}

impl fmt::Debug for NativeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeDescriptor")
            .field("product_name", &read_c_string(&self.product_name))
            .field("product_id", &self.product_id)
            .field("unique_id", &read_c_string(&self.unique_id))
            .finish()
    }
}

impl From<&NativeDescriptor> for DaqDeviceDescriptor {
    fn from(native: &NativeDescriptor) -> Self {
        DaqDeviceDescriptor {
            product_name: read_c_string(&native.product_name),
            product_id: native.product_id,
            interface_type: native.interface_type,
            dev_string: read_c_string(&native.dev_string),
            unique_id: read_c_string(&native.unique_id),
            nuid: native.nuid,
        }
    }
}

/// Reads a NUL-terminated byte buffer, replacing invalid UTF-8.
pub fn read_c_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Copies `text` into `buf`, truncating on a character boundary so one NUL byte always fits.
pub fn write_c_string(buf: &mut [u8], text: &str) {
    buf.fill(0);
    let capacity = buf.len().saturating_sub(1);
    let mut end = text.len().min(capacity);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    buf[..end].copy_from_slice(&text.as_bytes()[..end]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DaqDeviceDescriptor {
        DaqDeviceDescriptor {
            product_name: "USB-1208FS-Plus".to_string(),
            product_id: 232,
            interface_type: InterfaceType::USB.bits(),
            dev_string: String::new(),
            unique_id: "01D9A2F4".to_string(),
            nuid: 0x01D9A2F4,
        }
    }

    #[test]
    fn test_display_prefers_dev_string() {
        let mut desc = sample();
        assert_eq!(desc.to_string(), "USB-1208FS-Plus");
        desc.dev_string = "USB-1208FS-Plus::01D9A2F4".to_string();
        assert_eq!(desc.to_string(), "USB-1208FS-Plus::01D9A2F4");
    }

    #[test]
    fn test_native_layout_round_trip() {
        let desc = sample();
        let native = desc.to_native();
        assert_eq!(DaqDeviceDescriptor::from(&native), desc);
        assert_eq!(desc.interface(), InterfaceType::USB);
    }

    #[test]
    fn test_truncation_keeps_nul() {
        let mut buf = [0xffu8; 8];
        write_c_string(&mut buf, "ABCDEFGHIJ");
        assert_eq!(read_c_string(&buf), "ABCDEFG");
        write_c_string(&mut buf, "ééééé");
        assert_eq!(read_c_string(&buf), "ééé");
    }
}
