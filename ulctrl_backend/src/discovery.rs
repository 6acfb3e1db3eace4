//! Finding devices and binding them to board numbers at runtime.
//!
//! Devices configured ahead of time are bound to board numbers by the stored board
//! configuration. After `ignore_instacal`, or for devices that were never stored, a program finds
//! devices with [`inventory`] and binds one with [`DaqDevice::create`]. The binding lasts as long
//! as the returned guard.

use std::sync::Arc;
use tracing::{info, warn};

use ulcore_backend::*;

use crate::board::Board;
use crate::library::UniversalLibrary;

/// Upper bound on devices returned by one inventory call.
pub const MAX_DEVICES: usize = 100;

pub fn inventory(lib: &Arc<dyn UniversalLibrary>, interface: InterfaceType) -> UlResult<Vec<DaqDeviceDescriptor>> {
    lib.get_daq_device_inventory(interface, MAX_DEVICES)
}

/// A device bound to a board number; released on drop.
#[derive(Debug)]
pub struct DaqDevice {
    board: Board,
    descriptor: DaqDeviceDescriptor,
}

impl DaqDevice {
    pub fn create(lib: Arc<dyn UniversalLibrary>, board_num: i32, descriptor: DaqDeviceDescriptor) -> UlResult<Self> {
        lib.create_daq_device(board_num, &descriptor)?;
        info!(
            "{} ({}) bound to board {}",
            descriptor.product_name, descriptor.unique_id, board_num
        );
        Ok(DaqDevice {
            board: Board::new(board_num, lib),
            descriptor,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_num(&self) -> i32 {
        self.board.board_num()
    }

    pub fn descriptor(&self) -> &DaqDeviceDescriptor {
        &self.descriptor
    }
}

impl Drop for DaqDevice {
    fn drop(&mut self) {
        if let Err(err) = self.board.lib().release_daq_device(self.board.board_num()) {
            warn!("releasing board {}: {}", self.board.board_num(), err);
        }
    }
}

/// Binds the first discovered device to `board_num`.
///
/// With a non-empty `product_ids` list only devices with one of those ids qualify. No matching
/// device is `BADBOARD`.
pub fn config_first_detected_device(
    lib: Arc<dyn UniversalLibrary>,
    board_num: i32,
    product_ids: &[u32],
) -> UlResult<DaqDevice> {
    let devices = inventory(&lib, InterfaceType::ANY)?;
    if devices.is_empty() {
        return Err(UlError::with_context(ErrorCode::BADBOARD, "no devices found"));
    }
    let device = devices
        .into_iter()
        .find(|d| product_ids.is_empty() || product_ids.contains(&d.product_id))
        .ok_or_else(|| {
            UlError::with_context(
                ErrorCode::BADBOARD,
                format!("no device with product id in {:?}", product_ids),
            )
        })?;
    DaqDevice::create(lib, board_num, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedLibrary;

    fn hidden_lib() -> Arc<dyn UniversalLibrary> {
        let lib = SimulatedLibrary::new();
        for (n, id) in [(0, 234), (1, 125)] {
            let mut board = BoardConfig::demo(n);
            board.installed = false;
            board.product_id = id;
            lib.add_board(board);
        }
        Arc::new(lib)
    }

    #[test]
    fn test_first_detected_matches_product_id() {
        let lib = hidden_lib();
        let device = config_first_detected_device(lib.clone(), 4, &[125]).unwrap();
        assert_eq!(device.descriptor().product_id, 125);
        assert_eq!(device.board().name().unwrap(), "USB-1608FS-Plus");
        let err = config_first_detected_device(lib, 5, &[999]).unwrap_err();
        assert!(err.is(ErrorCode::BADBOARD));
    }

    #[test]
    fn test_drop_releases_board() {
        let lib = hidden_lib();
        {
            let _device = config_first_detected_device(lib.clone(), 0, &[]).unwrap();
            assert_eq!(inventory(&lib, InterfaceType::ANY).unwrap().len(), 1);
        }
        assert_eq!(inventory(&lib, InterfaceType::ANY).unwrap().len(), 2);
        assert!(lib.get_board_name(0).unwrap_err().is(ErrorCode::BADBOARD));
    }
}
