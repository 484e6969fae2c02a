//! Runtime configuration for the three pipeline stages.
//!
//! Every stage takes its configuration by value at construction time; there
//! is no global configuration state. The defaults match the paired
//! transmitter.

use embassy_time::Duration;

use crate::consts::{ADDRESS_WIDTH, PACKET_LEN};
use crate::driver::DataRate;

/// Radio link parameters for the receive loop.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioConfig {
    /// RF channel (2400 + n MHz).
    pub channel: u8,
    /// Air data rate.
    pub data_rate: DataRate,
    /// Address opened on pipe 1.
    pub rx_address: [u8; ADDRESS_WIDTH],
    /// Static payload width; the frame is always 32 bytes on this link.
    pub payload_len: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: 106,
            data_rate: DataRate::Mbps1,
            rx_address: [0xEE, 0xDD, 0xCC, 0xBB, 0xAA],
            payload_len: PACKET_LEN as u8,
        }
    }
}

/// Parameters for the mode-decoding controller.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Per-axis pulse trim in microseconds, applied before clamping.
    pub trim: [i16; 2],
}

/// Timing of the display renderer.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RendererConfig {
    /// Wait before the display is initialized.
    pub power_on_delay: Duration,
    /// How long the boot placeholder stays up before "Ready".
    pub boot_delay: Duration,
    /// Bound on the wait for the frame transfer-complete signal.
    pub frame_timeout: Duration,
    /// Pause taken instead when that wait times out.
    pub frame_fallback: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            power_on_delay: Duration::from_millis(100),
            boot_delay: Duration::from_millis(500),
            frame_timeout: Duration::from_millis(100),
            frame_fallback: Duration::from_millis(10),
        }
    }
}
