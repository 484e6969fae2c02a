//! Constants used across the receiver link.
//!
//! This module defines the nRF24L01+ register map, the SPI command set,
//! the bit masks used inside individual registers, and the fixed sizes
//! of the over-the-air frame and the inter-task messages.
//!
//! ## Key Concepts
//!
//! - **Registers**: 5-bit addresses OR-ed into the read/write command byte.
//! - **Commands**: the first byte of every chip-select framed transaction.
//! - **Bit masks**: positions of individual flags inside `CONFIG`, `STATUS`,
//!   `RF_SETUP`, `EN_RXADDR` and `FIFO_STATUS`.
//! - **Frame sizes**: both link ends exchange exactly [`PACKET_LEN`] bytes.
//!
//! The reset values in [`registers::DEFAULTS`] are written on every
//! `init_receive`/`init_transmit`, so a warm restart never inherits state
//! from a previous configuration.

/// Register addresses of the nRF24L01+.
pub mod registers {
    /// Configuration: IRQ masks, CRC, power and primary RX/TX.
    pub const CONFIG: u8 = 0x00;
    /// Enable auto-acknowledgment per pipe.
    pub const EN_AA: u8 = 0x01;
    /// Enable receive pipes.
    pub const EN_RXADDR: u8 = 0x02;
    /// Address width.
    pub const SETUP_AW: u8 = 0x03;
    /// Auto-retransmit delay (high nibble) and count (low nibble).
    pub const SETUP_RETR: u8 = 0x04;
    /// RF channel.
    pub const RF_CH: u8 = 0x05;
    /// Air data rate and output power.
    pub const RF_SETUP: u8 = 0x06;
    /// Status flags (write 1 to clear IRQ bits).
    pub const STATUS: u8 = 0x07;
    /// Receive address, pipe 0 (5 bytes).
    pub const RX_ADDR_P0: u8 = 0x0A;
    /// Receive address, pipe 1 (5 bytes).
    pub const RX_ADDR_P1: u8 = 0x0B;
    /// Transmit address (5 bytes).
    pub const TX_ADDR: u8 = 0x10;
    /// Payload width, pipe 0.
    pub const RX_PW_P0: u8 = 0x11;
    /// Payload width, pipe 1.
    pub const RX_PW_P1: u8 = 0x12;
    /// Payload width, pipe 2.
    pub const RX_PW_P2: u8 = 0x13;
    /// Payload width, pipe 3.
    pub const RX_PW_P3: u8 = 0x14;
    /// Payload width, pipe 4.
    pub const RX_PW_P4: u8 = 0x15;
    /// Payload width, pipe 5.
    pub const RX_PW_P5: u8 = 0x16;
    /// FIFO occupancy flags.
    pub const FIFO_STATUS: u8 = 0x17;
    /// Dynamic payload length per pipe.
    pub const DYNPD: u8 = 0x1C;
    /// Feature register.
    pub const FEATURE: u8 = 0x1D;

    /// Register reset table, written in order on every initialization.
    ///
    /// `RF_SETUP = 0x07` is 1 Mbps at 0 dBm, `STATUS = 0x7E` clears all
    /// three IRQ flags.
    pub const DEFAULTS: [(u8, u8); 17] = [
        (CONFIG, 0x08),
        (EN_AA, 0x3F),
        (EN_RXADDR, 0x03),
        (SETUP_AW, 0x03),
        (SETUP_RETR, 0x03),
        (RF_CH, 0x02),
        (RF_SETUP, 0x07),
        (STATUS, 0x7E),
        (RX_PW_P0, 0x00),
        (RX_PW_P1, 0x00),
        (RX_PW_P2, 0x00),
        (RX_PW_P3, 0x00),
        (RX_PW_P4, 0x00),
        (RX_PW_P5, 0x00),
        (FIFO_STATUS, 0x11),
        (DYNPD, 0x00),
        (FEATURE, 0x00),
    ];
}

/// SPI command bytes.
pub mod commands {
    /// Read register; OR with a 5-bit register address.
    pub const R_REGISTER: u8 = 0x00;
    /// Write register; OR with a 5-bit register address.
    pub const W_REGISTER: u8 = 0x20;
    /// Read the oldest payload from the RX FIFO.
    pub const R_RX_PAYLOAD: u8 = 0x61;
    /// Write a payload into the TX FIFO.
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    /// Flush the TX FIFO.
    pub const FLUSH_TX: u8 = 0xE1;
    /// Flush the RX FIFO.
    pub const FLUSH_RX: u8 = 0xE2;
    /// No operation; only clocks out STATUS.
    pub const NOP: u8 = 0xFF;

    /// Mask applied to register addresses inside a command byte.
    pub const REGISTER_MASK: u8 = 0x1F;
}

/// Bit positions inside individual registers.
pub mod bits {
    /// `CONFIG`: enable CRC.
    pub const EN_CRC: u8 = 1 << 3;
    /// `CONFIG`: CRC encoding scheme, set for 2 bytes.
    pub const CRCO: u8 = 1 << 2;
    /// `CONFIG`: power up.
    pub const PWR_UP: u8 = 1 << 1;
    /// `CONFIG`: primary receiver.
    pub const PRIM_RX: u8 = 1 << 0;

    /// `STATUS`: data ready in RX FIFO.
    pub const RX_DR: u8 = 1 << 6;
    /// `STATUS`: data sent from TX FIFO.
    pub const TX_DS: u8 = 1 << 5;
    /// `STATUS`: maximum number of retransmits reached.
    pub const MAX_RT: u8 = 1 << 4;
    /// `STATUS`: all three IRQ flags.
    pub const IRQ_MASK: u8 = RX_DR | TX_DS | MAX_RT;

    /// `RF_SETUP`: low data-rate bit (250 kbps).
    pub const RF_DR_LOW: u8 = 1 << 5;
    /// `RF_SETUP`: high data-rate bit (2 Mbps).
    pub const RF_DR_HIGH: u8 = 1 << 3;
    /// `RF_SETUP`: both output-power bits.
    pub const RF_PWR_MASK: u8 = (1 << 2) | (1 << 1);

    /// `EN_RXADDR`: enable pipe 1.
    pub const ERX_P1: u8 = 1 << 1;

    /// `FIFO_STATUS`: TX FIFO full.
    pub const TX_FULL: u8 = 1 << 5;
    /// `FIFO_STATUS`: TX FIFO empty.
    pub const TX_EMPTY: u8 = 1 << 4;
    /// `FIFO_STATUS`: RX FIFO full.
    pub const RX_FULL: u8 = 1 << 1;
    /// `FIFO_STATUS`: RX FIFO empty.
    pub const RX_EMPTY: u8 = 1 << 0;
}

/// Size of the over-the-air frame, which is also the chip FIFO width.
pub const PACKET_LEN: usize = 32;

/// Payload bytes following the mode tag.
pub const PAYLOAD_LEN: usize = PACKET_LEN - 1;

/// Maximum number of visible bytes in a display text.
pub const TEXT_CAPACITY: usize = 31;

/// Width in bytes of every pipe address.
pub const ADDRESS_WIDTH: usize = 5;

/// Highest valid RF channel (2400 + 125 MHz).
pub const MAX_CHANNEL: u8 = 125;

/// Depth of the radio to controller queue.
pub const RADIO_QUEUE_DEPTH: usize = 4;

/// Depth of the controller to renderer queue.
pub const DISPLAY_QUEUE_DEPTH: usize = 8;
