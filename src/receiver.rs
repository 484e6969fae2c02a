//! Interrupt-driven receive loop.
//!
//! [`ReceiverLoop`] owns the transceiver in primary-receiver mode. It sleeps
//! on the radio [`IrqLine`], drains one payload per wake and hands it to the
//! controller with a non-blocking enqueue. When the controller queue is full
//! the new packet is dropped: the radio path never waits on the rest of the
//! system.
//!
//! ## States
//!
//! `Uninitialized -> Listening`, or `Uninitialized -> Dead` when the chip
//! cannot be configured. `Dead` is final; the other stages keep running and
//! simply never see another packet.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Sender, TrySendError};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::config::RadioConfig;
use crate::consts::{PACKET_LEN, RADIO_QUEUE_DEPTH};
use crate::driver::{Error, Nrf24};
use crate::indicator::Indicator;
use crate::irq::IrqLine;
use crate::packet::RadioPacket;

/// Lifecycle of the receive loop.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ReceiverState {
    /// The chip has not been configured yet.
    #[default]
    Uninitialized,
    /// Chip-enable is asserted and the loop waits for interrupts.
    Listening,
    /// Configuration failed; the loop has stopped for good.
    Dead,
}

/// What one interrupt wake produced.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Delivery {
    /// No payload was waiting.
    Idle,
    /// A packet was queued for the controller.
    Forwarded,
    /// A packet was read but the controller queue was full.
    Dropped,
    /// The chip did not answer while reading the payload.
    Fault,
}

/// The receive stage of the pipeline.
pub struct ReceiverLoop<'a, M, SPI, CE, D, I>
where
    M: RawMutex,
{
    radio: Nrf24<SPI, CE, D>,
    irq: &'a IrqLine<M>,
    packets: Sender<'a, M, RadioPacket, RADIO_QUEUE_DEPTH>,
    indicator: I,
    config: RadioConfig,
    state: ReceiverState,
    forwarded: u32,
    dropped: u32,
}

impl<'a, M, SPI, CE, D, I> ReceiverLoop<'a, M, SPI, CE, D, I>
where
    M: RawMutex,
    SPI: SpiDevice,
    CE: OutputPin,
    D: DelayNs,
    I: Indicator,
{
    /// Creates the loop; nothing touches the chip until [`init`](Self::init).
    pub fn new(
        radio: Nrf24<SPI, CE, D>,
        irq: &'a IrqLine<M>,
        packets: Sender<'a, M, RadioPacket, RADIO_QUEUE_DEPTH>,
        indicator: I,
        config: RadioConfig,
    ) -> Self {
        Self {
            radio,
            irq,
            packets,
            indicator,
            config,
            state: ReceiverState::Uninitialized,
            forwarded: 0,
            dropped: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Packets handed to the controller so far.
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Packets discarded because the controller queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Gives back the driver.
    pub fn release(self) -> Nrf24<SPI, CE, D> {
        self.radio
    }

    /// Configures the chip for reception with the configured payload width
    /// and opens pipe 1.
    ///
    /// On success the loop is `Listening`; on failure it is `Dead` and the
    /// error is returned once, for the caller to log.
    pub fn init(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        let result = self.configure();
        self.state = match result {
            Ok(()) => ReceiverState::Listening,
            Err(_) => ReceiverState::Dead,
        };
        result
    }

    fn configure(&mut self) -> Result<(), Error<SPI::Error, CE::Error>> {
        self.radio.set_payload_len(self.config.payload_len);
        self.radio
            .init_receive(self.config.channel, self.config.data_rate)?;
        self.radio.set_rx_address_pipe1(&self.config.rx_address)?;
        self.radio.power_up()?;
        self.radio.chip_enable(true)
    }

    /// Handles one interrupt wake.
    ///
    /// If `RX_DR` is set the payload is read and offered to the controller
    /// queue without waiting. The IRQ flags are cleared afterwards in every
    /// case so the line can fire again.
    pub async fn service(&mut self) -> Delivery {
        let ready = match self.radio.is_data_ready() {
            Ok(ready) => ready,
            Err(_) => {
                warn!("radio: STATUS read failed");
                false
            }
        };

        let delivery = if ready {
            self.forward().await
        } else {
            Delivery::Idle
        };

        if self.radio.reset_irq_flags().is_err() {
            warn!("radio: clearing IRQ flags failed");
        }
        delivery
    }

    async fn forward(&mut self) -> Delivery {
        let mut frame = [0u8; PACKET_LEN];
        if self.radio.receive(&mut frame).is_err() {
            warn!("radio: RX FIFO read failed");
            return Delivery::Fault;
        }

        let packet = RadioPacket::from_bytes(&frame);
        match self.packets.try_send(packet) {
            Ok(()) => {
                self.forwarded = self.forwarded.wrapping_add(1);
                trace!("radio: forwarded packet, mode tag {}", frame[0]);
                self.indicator.acknowledge().await;
                Delivery::Forwarded
            }
            Err(TrySendError::Full(_)) => {
                self.dropped = self.dropped.wrapping_add(1);
                debug!("radio: controller queue full, {} dropped", self.dropped);
                Delivery::Dropped
            }
        }
    }

    /// Runs the loop.
    ///
    /// Returns only if the chip cannot be configured; there is no retry.
    pub async fn run(&mut self) {
        if self.init().is_err() {
            warn!("radio: init failed, receive loop stopped");
            return;
        }
        info!("radio: listening on channel {}", self.config.channel);

        loop {
            self.irq.wait().await;
            let _ = self.service().await;
        }
    }
}

impl<M, SPI, CE, D, I> fmt::Debug for ReceiverLoop<'_, M, SPI, CE, D, I>
where
    M: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverLoop")
            .field("state", &self.state)
            .field("forwarded", &self.forwarded)
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}
