//! # rc24rx
//!
//! A portable, no_std receiver node for an nRF24L01+ 2.4 GHz remote-control
//! link, built on `embedded-hal` 1.0 and `embassy-sync`.
//!
//! The node runs three independent loops joined by bounded queues:
//!
//! - [`receiver::ReceiverLoop`]: wakes on the radio IRQ, reads one payload
//!   and offers it to the controller without ever blocking
//! - [`controller::Controller`]: decodes the packet mode, drives two servo
//!   outputs and emits display commands
//! - [`renderer::Renderer`]: keeps the on-screen state and redraws it only
//!   when something changed, paced by the display's transfer-complete
//!   interrupt
//!
//! The queues and signals live in a [`link::Link`], usually a `static`
//! declared with [`declare_link!`]. Interrupt handlers only post to it, via
//! [`radio_irq!`] and [`frame_done_irq!`].
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` |
//! | `defmt-0-3` | Uses `defmt` logging and derives `defmt::Format` |
//! | `log`       | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rc24rx::config::{ControllerConfig, RadioConfig, RendererConfig};
//! use rc24rx::driver::Nrf24;
//! use rc24rx::indicator::BlinkLed;
//! use rc24rx::servo::ServoPwm;
//!
//! rc24rx::declare_link!(LINK);
//!
//! #[interrupt]
//! fn EXTI4() {
//!     rc24rx::radio_irq!(LINK);
//! }
//!
//! let mut rx = LINK.receiver(Nrf24::new(spi, ce, delay, 32), BlinkLed::new(led), RadioConfig::default());
//! let mut ctl = LINK.controller(ServoPwm::new(pwm_x), ServoPwm::new(pwm_y), ControllerConfig::default());
//! let mut ui = LINK.renderer(oled, RendererConfig::default());
//! join3(rx.run(), ctl.run(), ui.run()).await;
//! ```
//!
//! ## Integration Notes
//!
//! - The driver assumes a 5-byte address and a static 32-byte payload on both
//!   link ends
//! - Only one [`receiver::ReceiverLoop`] may own the transceiver
//! - Glyph rasterization is left to the [`renderer::DisplaySurface`]
//!   implementation

#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    while_true,
    unused_extern_crates,
    unused_import_braces
)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    unused,
    unused_qualifications
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// must come first so the logging macros are visible in every module
#[macro_use]
mod fmt;

pub use embassy_sync;

pub mod config;
pub mod consts;
pub mod controller;
pub mod driver;
pub mod indicator;
pub mod irq;
pub mod link;
pub mod packet;
pub mod receiver;
pub mod renderer;
pub mod servo;
