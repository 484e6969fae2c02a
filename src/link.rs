//! Composition root.
//!
//! A [`Link`] owns every queue and signal that joins the stages:
//!
//! ```text
//!  radio IRQ ──notify──▶ IrqLine
//!                          │
//!                   ReceiverLoop ──try_send──▶ packets (4) ──▶ Controller
//!                                                                 │ send
//!                                                                 ▼
//!  display DMA IRQ ──signal──▶ frame_done ◀── Renderer ◀── commands (8)
//! ```
//!
//! It is const-constructible so it can be a `static` (see
//! [`declare_link!`](crate::declare_link)); the stages borrow their handles
//! from it and are otherwise independent of each other.
//!
//! # Example
//! ```rust,ignore
//! rc24rx::declare_link!(LINK);
//!
//! #[embassy_executor::task]
//! async fn radio(mut rx: ReceiverLoop<'static, CriticalSectionRawMutex, Spi, Ce, Delay, BlinkLed<Led>>) {
//!     rx.run().await
//! }
//!
//! let rx = LINK.receiver(Nrf24::new(spi, ce, delay, 32), BlinkLed::new(led), RadioConfig::default());
//! let ctl = LINK.controller(ServoPwm::new(pwm_x), ServoPwm::new(pwm_y), ControllerConfig::default());
//! let ui = LINK.renderer(oled, RendererConfig::default());
//! ```

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::config::{ControllerConfig, RadioConfig, RendererConfig};
use crate::consts::{DISPLAY_QUEUE_DEPTH, RADIO_QUEUE_DEPTH};
use crate::controller::Controller;
use crate::driver::Nrf24;
use crate::indicator::Indicator;
use crate::irq::IrqLine;
use crate::packet::{DisplayCommand, RadioPacket};
use crate::receiver::ReceiverLoop;
use crate::renderer::{DisplaySurface, Renderer};
use crate::servo::PulseOutput;

/// Queues and signals shared by the receive, control and display stages.
pub struct Link<M: RawMutex> {
    irq: IrqLine<M>,
    packets: Channel<M, RadioPacket, RADIO_QUEUE_DEPTH>,
    commands: Channel<M, DisplayCommand, DISPLAY_QUEUE_DEPTH>,
    frame_done: Signal<M, ()>,
}

impl<M: RawMutex> Link<M> {
    /// Creates a link with empty queues and no pending signals.
    pub const fn new() -> Self {
        Self {
            irq: IrqLine::new(),
            packets: Channel::new(),
            commands: Channel::new(),
            frame_done: Signal::new(),
        }
    }

    /// The radio interrupt line, posted from the IRQ pin handler.
    pub fn irq(&self) -> &IrqLine<M> {
        &self.irq
    }

    /// The frame transfer-complete signal, posted from the display handler.
    pub fn frame_done(&self) -> &Signal<M, ()> {
        &self.frame_done
    }

    /// Packets waiting for the controller.
    pub fn queued_packets(&self) -> usize {
        self.packets.len()
    }

    /// Commands waiting for the renderer.
    pub fn queued_commands(&self) -> usize {
        self.commands.len()
    }

    /// Builds the receive stage around `radio`.
    pub fn receiver<SPI, CE, D, I>(
        &self,
        radio: Nrf24<SPI, CE, D>,
        indicator: I,
        config: RadioConfig,
    ) -> ReceiverLoop<'_, M, SPI, CE, D, I>
    where
        SPI: SpiDevice,
        CE: OutputPin,
        D: DelayNs,
        I: Indicator,
    {
        ReceiverLoop::new(radio, &self.irq, self.packets.sender(), indicator, config)
    }

    /// Builds the control stage around the two actuators.
    pub fn controller<X, Y>(&self, x: X, y: Y, config: ControllerConfig) -> Controller<'_, M, X, Y>
    where
        X: PulseOutput,
        Y: PulseOutput,
    {
        Controller::new(
            self.packets.receiver(),
            self.commands.sender(),
            x,
            y,
            config,
        )
    }

    /// Builds the display stage around `surface`.
    pub fn renderer<S>(&self, surface: S, config: RendererConfig) -> Renderer<'_, M, S>
    where
        S: DisplaySurface,
    {
        Renderer::new(surface, self.commands.receiver(), &self.frame_done, config)
    }
}

impl<M: RawMutex> Default for Link<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> fmt::Debug for Link<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("irq", &self.irq)
            .field("packets", &self.packets.len())
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}
