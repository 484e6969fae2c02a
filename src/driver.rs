//! Register-level driver for the nRF24L01+ 2.4 GHz transceiver.
//!
//! This module provides the [`Nrf24`] struct, which operates the chip
//! through its SPI command protocol using `embedded-hal` traits. Every
//! register access is a single chip-select framed [`SpiDevice`] transaction:
//! one command byte encoding the operation and register address, followed by
//! 0..32 data bytes. The first byte clocked back in every transaction is the
//! chip's `STATUS` register, which the driver caches.
//!
//! ## Features
//!
//! - Primary-receiver and primary-transmitter initialization from a fixed
//!   register reset table
//! - RX/TX FIFO access and flushing
//! - IRQ flag inspection and clearing
//! - Bit-packed configuration fields updated via read-modify-write
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::spi::Mock as SpiMock;
//! # use embedded_hal_mock::eh1::digital::Mock as PinMock;
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! use rc24rx::driver::Nrf24;
//!
//! # let spi = SpiMock::<u8>::new(&[]);
//! # let ce = PinMock::new(&[]);
//! let radio = Nrf24::new(spi, ce, NoopDelay::new(), 32);
//! assert_eq!(radio.payload_len(), 32);
//! # let (mut spi, mut ce, _) = radio.release();
//! # spi.done();
//! # ce.done();
//! ```
//!
//! ## Failure Semantics
//!
//! There is no chip-presence check. The bus timeout belongs to the HAL's
//! [`SpiDevice`] implementation; a failing transaction is returned as
//! [`Error::Spi`] and never retried here. The chip's own auto-retransmit is
//! the only retry mechanism on the link.

use crate::consts::{ADDRESS_WIDTH, MAX_CHANNEL, PACKET_LEN, bits, commands, registers};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// Longest transaction: one command byte plus a full FIFO payload.
const FRAME_LEN: usize = PACKET_LEN + 1;

/// Settling time after the pins are reset and before the first register write.
const RESET_SETTLE_MS: u32 = 5;

/// Crystal start-up after `PWR_UP` is set (datasheet Tpd2stby is 1.5 ms).
const POWER_UP_SETTLE_MS: u32 = 2;

/// Errors reported by [`Nrf24`].
#[derive(Debug, thiserror::Error)]
pub enum Error<SpiE, PinE> {
    /// The SPI transaction did not complete.
    #[error("SPI transaction failed: {0:?}")]
    Spi(SpiE),
    /// The chip-enable line could not be driven.
    #[error("chip-enable pin write failed: {0:?}")]
    Pin(PinE),
}

/// Air data rate, encoded in `RF_SETUP` bits 5 and 3.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DataRate {
    /// 250 kbps (`RF_DR_LOW`).
    Kbps250,
    /// 1 Mbps (both bits clear).
    #[default]
    Mbps1,
    /// 2 Mbps (`RF_DR_HIGH`).
    Mbps2,
}

impl DataRate {
    const fn bits(self) -> u8 {
        match self {
            DataRate::Kbps250 => bits::RF_DR_LOW,
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => bits::RF_DR_HIGH,
        }
    }
}

/// Transmit output power, encoded in `RF_SETUP` bits 2:1.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OutputPower {
    /// -18 dBm
    Minus18Dbm = 0,
    /// -12 dBm
    Minus12Dbm = 1,
    /// -6 dBm
    Minus6Dbm = 2,
    /// 0 dBm
    #[default]
    ZeroDbm = 3,
}

impl OutputPower {
    const fn bits(self) -> u8 {
        (self as u8) << 1
    }
}

/// CRC length, encoded in the adjacent `EN_CRC` and `CRCO` bits of `CONFIG`.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CrcLength {
    /// No CRC.
    Disabled,
    /// 1-byte CRC.
    #[default]
    OneByte,
    /// 2-byte CRC.
    TwoBytes,
}

/// A snapshot of the `STATUS` register.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    /// A payload is waiting in the RX FIFO (`RX_DR`).
    pub const fn data_ready(self) -> bool {
        self.0 & bits::RX_DR != 0
    }

    /// The last payload was sent and, if enabled, acknowledged (`TX_DS`).
    pub const fn data_sent(self) -> bool {
        self.0 & bits::TX_DS != 0
    }

    /// Auto-retransmit gave up (`MAX_RT`).
    pub const fn max_retries(self) -> bool {
        self.0 & bits::MAX_RT != 0
    }

    /// Pipe number of the payload at the head of the RX FIFO, if any.
    pub const fn rx_pipe(self) -> Option<u8> {
        let pipe = (self.0 >> 1) & 0x07;
        if pipe <= 5 { Some(pipe) } else { None }
    }
}

/// A snapshot of the `FIFO_STATUS` register.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct FifoStatus(pub u8);

impl FifoStatus {
    /// RX FIFO holds no payloads.
    pub const fn rx_empty(self) -> bool {
        self.0 & bits::RX_EMPTY != 0
    }

    /// RX FIFO has no free slot.
    pub const fn rx_full(self) -> bool {
        self.0 & bits::RX_FULL != 0
    }

    /// TX FIFO holds no payloads.
    pub const fn tx_empty(self) -> bool {
        self.0 & bits::TX_EMPTY != 0
    }

    /// TX FIFO has no free slot.
    pub const fn tx_full(self) -> bool {
        self.0 & bits::TX_FULL != 0
    }
}

/// Encodes an auto-retransmit delay for `SETUP_RETR[7:4]`.
///
/// The field counts in 250 us steps starting at 250 us, so the code is
/// `(delay / 250) - 1`, floored at 0 and clamped to the 4-bit maximum
/// (4000 us).
pub const fn retransmit_delay_code(micros: u16) -> u8 {
    let code = (micros / 250).saturating_sub(1);
    if code > 0x0F { 0x0F } else { code as u8 }
}

/// Encodes an address width for `SETUP_AW`, or `None` outside 3..=5 bytes.
pub const fn address_width_code(bytes: u8) -> Option<u8> {
    if matches!(bytes, 3..=5) {
        Some(bytes - 2)
    } else {
        None
    }
}

/// Driver for one nRF24L01+ on a dedicated [`SpiDevice`].
///
/// ## Type Parameters
///
/// - `SPI`: the chip's SPI device; it owns chip-select framing
/// - `CE`: the chip-enable output
/// - `D`: a blocking delay used for the reset and power-up settle times
///
/// The driver is the only owner of the chip's registers. Nothing outside it
/// reads or writes them, so no locking is involved.
#[derive(Debug)]
pub struct Nrf24<SPI, CE, D> {
    spi: SPI,
    ce: CE,
    delay: D,
    payload_len: u8,
    status: Status,
}

impl<SPI, CE, D> Nrf24<SPI, CE, D>
where
    SPI: SpiDevice,
    CE: OutputPin,
    D: DelayNs,
{
    /// Creates a driver for static payloads of `payload_len` bytes.
    ///
    /// `payload_len` is clamped to 1..=32. No bus traffic happens until one
    /// of the `init_*` methods is called.
    pub fn new(spi: SPI, ce: CE, delay: D, payload_len: u8) -> Self {
        Self {
            spi,
            ce,
            delay,
            payload_len: payload_len.clamp(1, PACKET_LEN as u8),
            status: Status::default(),
        }
    }

    /// Gives back the bus, the chip-enable pin and the delay.
    pub fn release(self) -> (SPI, CE, D) {
        (self.spi, self.ce, self.delay)
    }

    /// Static payload width in bytes.
    pub fn payload_len(&self) -> u8 {
        self.payload_len
    }

    /// Changes the static payload width, clamped to 1..=32.
    ///
    /// Takes effect on the chip at the next `init_*` or
    /// [`set_rx_address_pipe1`](Nrf24::set_rx_address_pipe1) call.
    pub fn set_payload_len(&mut self, payload_len: u8) {
        self.payload_len = payload_len.clamp(1, PACKET_LEN as u8);
    }

    /// `STATUS` as clocked out by the most recent transaction.
    pub fn last_status(&self) -> Status {
        self.status
    }

    /// Configures the chip as primary receiver and starts listening.
    ///
    /// Resets every register to its default, flushes both FIFOs, clears all
    /// IRQ flags, sets `PRIM_RX`, powers up, then programs pipe-0 payload
    /// width, 5-byte addresses, 1-byte CRC, 3 retransmits every 250 us, the
    /// RF channel, `rate` and 0 dBm. Chip-enable is asserted last.
    pub fn init_receive(
        &mut self,
        channel: u8,
        rate: DataRate,
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.reset()?;
        self.update_register(registers::CONFIG, |config| config | bits::PRIM_RX)?;
        self.power_up()?;
        self.write_register(registers::RX_PW_P0, self.payload_len)?;
        self.configure_link(channel, rate)?;
        self.chip_enable(true)
    }

    /// Configures the chip as primary transmitter.
    ///
    /// Same sequence as [`init_receive`](Nrf24::init_receive) without the
    /// payload width; chip-enable stays deasserted until a frame is queued.
    pub fn init_transmit(
        &mut self,
        channel: u8,
        rate: DataRate,
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.reset()?;
        self.update_register(registers::CONFIG, |config| config & !bits::PRIM_RX)?;
        self.power_up()?;
        self.configure_link(channel, rate)?;
        self.chip_enable(false)
    }

    /// Writes the 5-byte transmit address.
    pub fn set_tx_address(
        &mut self,
        address: &[u8; ADDRESS_WIDTH],
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register_multi(registers::TX_ADDR, address)
    }

    /// Writes the 5-byte receive address of pipe 0.
    pub fn set_rx_address_pipe0(
        &mut self,
        address: &[u8; ADDRESS_WIDTH],
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register_multi(registers::RX_ADDR_P0, address)
    }

    /// Opens pipe 1 on `address` with the static payload width.
    ///
    /// The pipe's enable bit is set with a read-modify-write so the other
    /// pipes keep their state.
    pub fn set_rx_address_pipe1(
        &mut self,
        address: &[u8; ADDRESS_WIDTH],
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register_multi(registers::RX_ADDR_P1, address)?;
        self.write_register(registers::RX_PW_P1, self.payload_len)?;
        self.update_register(registers::EN_RXADDR, |enabled| enabled | bits::ERX_P1)
    }

    /// Reads one payload from the RX FIFO into `out` and clears `RX_DR`.
    ///
    /// Copies `min(out.len(), payload_len)` bytes; the rest of `out` is left
    /// untouched.
    pub fn receive(&mut self, out: &mut [u8]) -> Result<(), Error<SPI::Error, CE::Error>> {
        let len = self.payload_len as usize;
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = commands::R_RX_PAYLOAD;
        let _ = self.exchange(&mut frame[..=len])?;
        let copied = out.len().min(len);
        out[..copied].copy_from_slice(&frame[1..=copied]);
        self.clear_rx_dr()
    }

    /// Writes one payload into the TX FIFO.
    ///
    /// Short buffers are zero-padded to the payload width; long ones are cut.
    pub fn transmit(&mut self, payload: &[u8]) -> Result<(), Error<SPI::Error, CE::Error>> {
        let len = self.payload_len as usize;
        let copied = payload.len().min(len);
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = commands::W_TX_PAYLOAD;
        frame[1..=copied].copy_from_slice(&payload[..copied]);
        let _ = self.exchange(&mut frame[..=len])?;
        Ok(())
    }

    /// Services a transmit-side interrupt.
    ///
    /// Clears `TX_DS` when set. When `MAX_RT` is set it is cleared and the TX
    /// FIFO flushed, so the failed frame is not silently retried. Returns the
    /// status seen before clearing.
    pub fn handle_tx_irq(&mut self) -> Result<Status, Error<SPI::Error, CE::Error>> {
        let status = self.get_status()?;
        if status.data_sent() {
            self.clear_tx_ds()?;
        }
        if status.max_retries() {
            self.clear_max_rt()?;
            let _ = self.flush_tx()?;
        }
        Ok(status)
    }

    /// Whether `RX_DR` is set.
    pub fn is_data_ready(&mut self) -> Result<bool, Error<SPI::Error, CE::Error>> {
        Ok(Status(self.read_register(registers::STATUS)?).data_ready())
    }

    /// Clears `RX_DR`, `TX_DS` and `MAX_RT`, releasing the IRQ line.
    pub fn reset_irq_flags(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, bits::IRQ_MASK)
    }

    /// Clears `RX_DR`.
    pub fn clear_rx_dr(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, bits::RX_DR)
    }

    /// Clears `TX_DS`.
    pub fn clear_tx_ds(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, bits::TX_DS)
    }

    /// Clears `MAX_RT`.
    pub fn clear_max_rt(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, bits::MAX_RT)
    }

    /// Sets `PWR_UP` and waits for the oscillator to settle.
    pub fn power_up(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::CONFIG, |config| config | bits::PWR_UP)?;
        self.delay.delay_ms(POWER_UP_SETTLE_MS);
        Ok(())
    }

    /// Clears `PWR_UP`.
    pub fn power_down(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::CONFIG, |config| config & !bits::PWR_UP)
    }

    /// Discards everything in the RX FIFO.
    pub fn flush_rx(&mut self) -> Result<Status, Error<SPI::Error, CE::Error>> {
        self.command(commands::FLUSH_RX)
    }

    /// Discards everything in the TX FIFO.
    pub fn flush_tx(&mut self) -> Result<Status, Error<SPI::Error, CE::Error>> {
        self.command(commands::FLUSH_TX)
    }

    /// Drives the chip-enable line.
    pub fn chip_enable(&mut self, enable: bool) -> Result<(), Error<SPI::Error, CE::Error>> {
        if enable {
            self.ce.set_high().map_err(Error::Pin)
        } else {
            self.ce.set_low().map_err(Error::Pin)
        }
    }

    /// Reads `STATUS` with a no-op command.
    pub fn get_status(&mut self) -> Result<Status, Error<SPI::Error, CE::Error>> {
        self.command(commands::NOP)
    }

    /// Reads `FIFO_STATUS`.
    pub fn get_fifo_status(&mut self) -> Result<FifoStatus, Error<SPI::Error, CE::Error>> {
        Ok(FifoStatus(self.read_register(registers::FIFO_STATUS)?))
    }

    /// Selects the RF channel; values above 125 are clamped.
    pub fn set_channel(&mut self, channel: u8) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.write_register(registers::RF_CH, channel.min(MAX_CHANNEL))
    }

    /// Programs the air data rate, preserving the other `RF_SETUP` bits.
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::RF_SETUP, |setup| {
            (setup & !(bits::RF_DR_LOW | bits::RF_DR_HIGH)) | rate.bits()
        })
    }

    /// Programs the output power, preserving the other `RF_SETUP` bits.
    pub fn set_output_power(
        &mut self,
        power: OutputPower,
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::RF_SETUP, |setup| {
            (setup & !bits::RF_PWR_MASK) | power.bits()
        })
    }

    /// Programs the CRC length, preserving the other `CONFIG` bits.
    pub fn set_crc_length(&mut self, crc: CrcLength) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::CONFIG, |config| match crc {
            CrcLength::Disabled => config & !(bits::EN_CRC | bits::CRCO),
            CrcLength::OneByte => (config | bits::EN_CRC) & !bits::CRCO,
            CrcLength::TwoBytes => config | bits::EN_CRC | bits::CRCO,
        })
    }

    /// Programs the address width; widths outside 3..=5 are ignored.
    pub fn set_address_width(&mut self, bytes: u8) -> Result<(), Error<SPI::Error, CE::Error>> {
        match address_width_code(bytes) {
            Some(code) => self.write_register(registers::SETUP_AW, code),
            None => {
                warn!("ignoring address width {}", bytes);
                Ok(())
            }
        }
    }

    /// Sets the auto-retransmit count (low nibble of `SETUP_RETR`, max 15).
    pub fn set_retransmit_count(&mut self, count: u8) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.update_register(registers::SETUP_RETR, |retr| (retr & 0xF0) | (count & 0x0F))
    }

    /// Sets the auto-retransmit delay (high nibble of `SETUP_RETR`).
    ///
    /// See [`retransmit_delay_code`] for the encoding.
    pub fn set_retransmit_delay(&mut self, micros: u16) -> Result<(), Error<SPI::Error, CE::Error>> {
        let code = retransmit_delay_code(micros);
        self.update_register(registers::SETUP_RETR, |retr| (retr & 0x0F) | (code << 4))
    }

    fn reset(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.chip_enable(false)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        for (register, value) in registers::DEFAULTS {
            self.write_register(register, value)?;
        }

        let _ = self.flush_rx()?;
        let _ = self.flush_tx()?;
        self.reset_irq_flags()
    }

    fn configure_link(
        &mut self,
        channel: u8,
        rate: DataRate,
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.set_address_width(ADDRESS_WIDTH as u8)?;
        self.set_crc_length(CrcLength::OneByte)?;
        self.set_retransmit_count(3)?;
        self.set_retransmit_delay(250)?;
        self.set_channel(channel)?;
        self.set_data_rate(rate)?;
        self.set_output_power(OutputPower::ZeroDbm)
    }

    /// Runs one chip-select framed transaction in place.
    fn exchange(&mut self, frame: &mut [u8]) -> Result<Status, Error<SPI::Error, CE::Error>> {
        self.spi.transfer_in_place(frame).map_err(Error::Spi)?;
        self.status = Status(frame[0]);
        Ok(self.status)
    }

    fn command(&mut self, command: u8) -> Result<Status, Error<SPI::Error, CE::Error>> {
        let mut frame = [command];
        self.exchange(&mut frame)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<SPI::Error, CE::Error>> {
        let mut frame = [commands::R_REGISTER | (register & commands::REGISTER_MASK), 0];
        let _ = self.exchange(&mut frame)?;
        Ok(frame[1])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<SPI::Error, CE::Error>> {
        let mut frame = [commands::W_REGISTER | (register & commands::REGISTER_MASK), value];
        let _ = self.exchange(&mut frame)?;
        Ok(())
    }

    fn write_register_multi(
        &mut self,
        register: u8,
        data: &[u8],
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        let len = data.len().min(PACKET_LEN);
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = commands::W_REGISTER | (register & commands::REGISTER_MASK);
        frame[1..=len].copy_from_slice(&data[..len]);
        let _ = self.exchange(&mut frame[..=len])?;
        Ok(())
    }

    fn update_register(
        &mut self,
        register: u8,
        update: impl FnOnce(u8) -> u8,
    ) -> Result<(), Error<SPI::Error, CE::Error>> {
        let value = self.read_register(register)?;
        self.write_register(register, update(value))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    /// `STATUS` after reset: no IRQ flags, RX FIFO empty.
    pub(crate) const IDLE: u8 = 0x0E;

    pub(crate) fn frame(out: &[u8], back: &[u8]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(out.to_vec(), back.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    pub(crate) fn write(register: u8, value: u8) -> Vec<SpiTransaction<u8>> {
        frame(&[commands::W_REGISTER | register, value], &[IDLE, 0])
    }

    pub(crate) fn read(register: u8, value: u8) -> Vec<SpiTransaction<u8>> {
        read_with_status(register, value, IDLE)
    }

    pub(crate) fn read_with_status(
        register: u8,
        value: u8,
        status: u8,
    ) -> Vec<SpiTransaction<u8>> {
        frame(&[commands::R_REGISTER | register, 0], &[status, value])
    }

    pub(crate) fn command(command: u8, status: u8) -> Vec<SpiTransaction<u8>> {
        frame(&[command], &[status])
    }

    pub(crate) fn write_multi(register: u8, data: &[u8]) -> Vec<SpiTransaction<u8>> {
        let mut out = vec![commands::W_REGISTER | register];
        out.extend_from_slice(data);
        let mut back = vec![0u8; out.len()];
        back[0] = IDLE;
        frame(&out, &back)
    }

    pub(crate) fn reset_expectations() -> Vec<SpiTransaction<u8>> {
        let mut expected = Vec::new();
        for (register, value) in registers::DEFAULTS {
            expected.extend(write(register, value));
        }
        expected.extend(command(commands::FLUSH_RX, IDLE));
        expected.extend(command(commands::FLUSH_TX, IDLE));
        expected.extend(write(registers::STATUS, 0x70));
        expected
    }

    /// Address width, CRC, retransmit, channel, 1 Mbps, 0 dBm starting from
    /// the reset values.
    pub(crate) fn link_expectations(config: u8, channel: u8) -> Vec<SpiTransaction<u8>> {
        let mut expected = Vec::new();
        expected.extend(write(registers::SETUP_AW, 0x03));
        expected.extend(read(registers::CONFIG, config));
        expected.extend(write(registers::CONFIG, config | bits::EN_CRC));
        expected.extend(read(registers::SETUP_RETR, 0x03));
        expected.extend(write(registers::SETUP_RETR, 0x03));
        expected.extend(read(registers::SETUP_RETR, 0x03));
        expected.extend(write(registers::SETUP_RETR, 0x03));
        expected.extend(write(registers::RF_CH, channel));
        expected.extend(read(registers::RF_SETUP, 0x07));
        expected.extend(write(registers::RF_SETUP, 0x07));
        expected.extend(read(registers::RF_SETUP, 0x07));
        expected.extend(write(registers::RF_SETUP, 0x07));
        expected
    }

    pub(crate) fn init_receive_expectations(channel: u8, payload_len: u8) -> Vec<SpiTransaction<u8>> {
        let mut expected = reset_expectations();
        expected.extend(read(registers::CONFIG, 0x08));
        expected.extend(write(registers::CONFIG, 0x09));
        expected.extend(read(registers::CONFIG, 0x09));
        expected.extend(write(registers::CONFIG, 0x0B));
        expected.extend(write(registers::RX_PW_P0, payload_len));
        expected.extend(link_expectations(0x0B, channel));
        expected
    }

    fn driver(
        expected: &[SpiTransaction<u8>],
        pins: &[PinTransaction],
    ) -> Nrf24<SpiMock<u8>, PinMock, NoopDelay> {
        Nrf24::new(SpiMock::new(expected), PinMock::new(pins), NoopDelay::new(), 32)
    }

    fn finish(driver: Nrf24<SpiMock<u8>, PinMock, NoopDelay>) {
        let (mut spi, mut ce, _) = driver.release();
        spi.done();
        ce.done();
    }

    #[test]
    fn test_retransmit_delay_encoding() {
        assert_eq!(retransmit_delay_code(0), 0);
        assert_eq!(retransmit_delay_code(249), 0);
        assert_eq!(retransmit_delay_code(250), 0);
        assert_eq!(retransmit_delay_code(500), 1);
        assert_eq!(retransmit_delay_code(1000), 3);
        assert_eq!(retransmit_delay_code(4000), 15);
        assert_eq!(retransmit_delay_code(10_000), 15);
    }

    #[test]
    fn test_address_width_encoding() {
        assert_eq!(address_width_code(2), None);
        assert_eq!(address_width_code(3), Some(1));
        assert_eq!(address_width_code(4), Some(2));
        assert_eq!(address_width_code(5), Some(3));
        assert_eq!(address_width_code(6), None);
    }

    #[test]
    fn test_status_views() {
        let status = Status(0x4E | bits::MAX_RT);
        assert!(status.data_ready());
        assert!(!status.data_sent());
        assert!(status.max_retries());
        assert_eq!(status.rx_pipe(), None);
        assert_eq!(Status(0x42).rx_pipe(), Some(1));

        let fifo = FifoStatus(0x11);
        assert!(fifo.rx_empty());
        assert!(fifo.tx_empty());
        assert!(!fifo.rx_full());
        assert!(!fifo.tx_full());
    }

    #[test]
    fn test_payload_len_is_clamped() {
        let radio = driver(&[], &[]);
        assert_eq!(radio.payload_len(), 32);
        finish(radio);

        let radio = Nrf24::new(SpiMock::new(&[]), PinMock::new(&[]), NoopDelay::new(), 40);
        assert_eq!(radio.payload_len(), 32);
        finish(radio);

        let mut radio = Nrf24::new(SpiMock::new(&[]), PinMock::new(&[]), NoopDelay::new(), 0);
        assert_eq!(radio.payload_len(), 1);
        radio.set_payload_len(16);
        assert_eq!(radio.payload_len(), 16);
        radio.set_payload_len(99);
        assert_eq!(radio.payload_len(), 32);
        finish(radio);
    }

    #[test]
    fn test_init_receive_sequence() {
        let expected = init_receive_expectations(106, 32);
        let mut radio = driver(
            &expected,
            &[
                PinTransaction::set(PinState::Low),
                PinTransaction::set(PinState::High),
            ],
        );
        radio.init_receive(106, DataRate::Mbps1).unwrap();
        finish(radio);
    }

    #[test]
    fn test_init_transmit_leaves_chip_disabled() {
        let mut expected = reset_expectations();
        expected.extend(read(registers::CONFIG, 0x09));
        expected.extend(write(registers::CONFIG, 0x08));
        expected.extend(read(registers::CONFIG, 0x08));
        expected.extend(write(registers::CONFIG, 0x0A));
        expected.extend(link_expectations(0x0A, 125));

        let mut radio = driver(
            &expected,
            &[
                PinTransaction::set(PinState::Low),
                PinTransaction::set(PinState::Low),
            ],
        );
        // channel above 125 is clamped
        radio.init_transmit(200, DataRate::Mbps1).unwrap();
        finish(radio);
    }

    #[test]
    fn test_data_rate_preserves_unrelated_bits() {
        let mut expected = read(registers::RF_SETUP, 0x07);
        expected.extend(write(registers::RF_SETUP, 0x0F));
        expected.extend(read(registers::RF_SETUP, 0x0F));
        expected.extend(write(registers::RF_SETUP, 0x27));
        expected.extend(read(registers::RF_SETUP, 0x27));
        expected.extend(write(registers::RF_SETUP, 0x21));

        let mut radio = driver(&expected, &[]);
        radio.set_data_rate(DataRate::Mbps2).unwrap();
        radio.set_data_rate(DataRate::Kbps250).unwrap();
        radio.set_output_power(OutputPower::Minus18Dbm).unwrap();
        finish(radio);
    }

    #[test]
    fn test_crc_length_bits() {
        let mut expected = read(registers::CONFIG, 0x0B);
        expected.extend(write(registers::CONFIG, 0x0F));
        expected.extend(read(registers::CONFIG, 0x0F));
        expected.extend(write(registers::CONFIG, 0x03));
        expected.extend(read(registers::CONFIG, 0x07));
        expected.extend(write(registers::CONFIG, 0x0B));

        let mut radio = driver(&expected, &[]);
        radio.set_crc_length(CrcLength::TwoBytes).unwrap();
        radio.set_crc_length(CrcLength::Disabled).unwrap();
        radio.set_crc_length(CrcLength::OneByte).unwrap();
        finish(radio);
    }

    #[test]
    fn test_retransmit_fields_share_register() {
        let mut expected = read(registers::SETUP_RETR, 0x53);
        expected.extend(write(registers::SETUP_RETR, 0x5F));
        expected.extend(read(registers::SETUP_RETR, 0x5F));
        expected.extend(write(registers::SETUP_RETR, 0x3F));

        let mut radio = driver(&expected, &[]);
        radio.set_retransmit_count(0x1F).unwrap();
        radio.set_retransmit_delay(1000).unwrap();
        finish(radio);
    }

    #[test]
    fn test_invalid_address_width_is_ignored() {
        let expected = write(registers::SETUP_AW, 0x01);
        let mut radio = driver(&expected, &[]);
        radio.set_address_width(7).unwrap();
        radio.set_address_width(3).unwrap();
        finish(radio);
    }

    #[test]
    fn test_pipe1_setup_keeps_other_pipes() {
        let address = [0xEE, 0xDD, 0xCC, 0xBB, 0xAA];
        let mut expected = write_multi(registers::RX_ADDR_P1, &address);
        expected.extend(write(registers::RX_PW_P1, 32));
        expected.extend(read(registers::EN_RXADDR, 0x05));
        expected.extend(write(registers::EN_RXADDR, 0x07));

        let mut radio = driver(&expected, &[]);
        radio.set_rx_address_pipe1(&address).unwrap();
        finish(radio);
    }

    #[test]
    fn test_addresses_are_written_whole() {
        let address = [1, 2, 3, 4, 5];
        let mut expected = write_multi(registers::TX_ADDR, &address);
        expected.extend(write_multi(registers::RX_ADDR_P0, &address));

        let mut radio = driver(&expected, &[]);
        radio.set_tx_address(&address).unwrap();
        radio.set_rx_address_pipe0(&address).unwrap();
        finish(radio);
    }

    #[test]
    fn test_receive_reads_fifo_then_clears_rx_dr() {
        let mut back = vec![0x40u8];
        back.extend((1..=32).map(|b| b as u8));
        let mut out = vec![commands::R_RX_PAYLOAD];
        out.extend([0u8; 32]);
        let mut expected = frame(&out, &back);
        expected.extend(write(registers::STATUS, bits::RX_DR));

        let mut radio = driver(&expected, &[]);
        let mut buf = [0u8; 32];
        radio.receive(&mut buf).unwrap();
        assert_eq!(buf[0], 1);
        assert_eq!(buf[31], 32);
        assert!(!radio.last_status().data_ready());
        finish(radio);
    }

    #[test]
    fn test_transmit_pads_short_payload() {
        let mut out = vec![commands::W_TX_PAYLOAD, b'h', b'i'];
        out.extend([0u8; 6]);
        let mut back = vec![0u8; 9];
        back[0] = IDLE;
        let expected = frame(&out, &back);

        let mut radio = Nrf24::new(SpiMock::new(&expected), PinMock::new(&[]), NoopDelay::new(), 8);
        radio.transmit(b"hi").unwrap();
        finish(radio);
    }

    #[test]
    fn test_tx_irq_max_retries_flushes_fifo() {
        let mut expected = command(commands::NOP, IDLE | bits::MAX_RT);
        expected.extend(write(registers::STATUS, bits::MAX_RT));
        expected.extend(command(commands::FLUSH_TX, IDLE));

        let mut radio = driver(&expected, &[]);
        let status = radio.handle_tx_irq().unwrap();
        assert!(status.max_retries());
        assert!(!status.data_sent());
        finish(radio);
    }

    #[test]
    fn test_tx_irq_data_sent_only_clears_flag() {
        let mut expected = command(commands::NOP, IDLE | bits::TX_DS);
        expected.extend(write(registers::STATUS, bits::TX_DS));

        let mut radio = driver(&expected, &[]);
        assert!(radio.handle_tx_irq().unwrap().data_sent());
        finish(radio);
    }

    #[test]
    fn test_status_and_fifo_queries() {
        let mut expected = read_with_status(registers::STATUS, 0x4E, 0x4E);
        expected.extend(write(registers::STATUS, bits::IRQ_MASK));
        expected.extend(read(registers::FIFO_STATUS, 0x11));
        expected.extend(read(registers::CONFIG, 0x0B));
        expected.extend(write(registers::CONFIG, 0x09));

        let mut radio = driver(&expected, &[PinTransaction::set(PinState::High)]);
        assert!(radio.is_data_ready().unwrap());
        radio.reset_irq_flags().unwrap();
        assert!(radio.get_fifo_status().unwrap().rx_empty());
        radio.power_down().unwrap();
        radio.chip_enable(true).unwrap();
        finish(radio);
    }
}
