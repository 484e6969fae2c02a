//! Display state and the loop that renders it.
//!
//! [`DisplayState`] is what the screen should show. [`Renderer`] applies
//! [`DisplayCommand`]s to it and redraws only when something visible
//! changed. Each redraw is paced by the display's transfer-complete signal,
//! with a bounded wait so a silent display cannot wedge the loop.
//!
//! ## Layout (128 px wide)
//!
//! | Region     | Position               | Font        |
//! |------------|------------------------|-------------|
//! | status     | top-left `(0, 0)`      | small 6x8   |
//! | main text  | centered at `y = 20`   | large 11x18 |
//! | key        | `(54, 20)`             | large 11x18 |

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Timer};

use crate::config::RendererConfig;
use crate::consts::DISPLAY_QUEUE_DEPTH;
use crate::packet::{DisplayCommand, Text};

/// Display width in pixels.
pub const SCREEN_WIDTH: u16 = 128;
/// Top edge of the status line.
pub const STATUS_Y: u16 = 0;
/// Top edge of the main text and key region.
pub const MAIN_Y: u16 = 20;
/// Left edge of a single key glyph.
pub const KEY_X: u16 = 54;

/// Fixed-width fonts known to the layout.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Font {
    /// 6x8 glyphs, used for the status line.
    Small,
    /// 11x18 glyphs, used for the main text and the key.
    Large,
}

impl Font {
    /// Advance per glyph in pixels.
    pub const fn glyph_width(self) -> u16 {
        match self {
            Font::Small => 6,
            Font::Large => 11,
        }
    }
}

/// Left edge that centers `len` glyphs of `font`; 0 when they overflow.
pub const fn centered_x(len: usize, font: Font) -> u16 {
    let width = len.saturating_mul(font.glyph_width() as usize);
    if width >= SCREEN_WIDTH as usize {
        0
    } else {
        (SCREEN_WIDTH - width as u16) / 2
    }
}

/// A frame-buffered display.
///
/// Drawing only touches the frame buffer; [`flush`](Self::flush) starts the
/// transfer to the panel, whose completion is reported through the frame
/// done signal.
pub trait DisplaySurface {
    /// Bus or panel error.
    type Error;

    /// Brings the panel up. Called once before anything is drawn.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Blanks the frame buffer.
    fn clear(&mut self);

    /// Draws `text` with its top-left corner at `(x, y)`. Glyphs past the
    /// right edge are clipped.
    fn draw_text(&mut self, x: u16, y: u16, text: &[u8], font: Font);

    /// Starts sending the frame buffer to the panel.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// What the screen is meant to show.
///
/// The main text and the key share the centered region: setting one always
/// clears the other.
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct DisplayState {
    status: Text,
    main_text: Text,
    current_key: u8,
}

impl DisplayState {
    /// The placeholder shown while the system boots.
    pub fn booting() -> Self {
        Self {
            status: Text::from("Booting..."),
            main_text: Text::new(),
            current_key: 0,
        }
    }

    /// The idle state shown once boot is over.
    pub fn ready() -> Self {
        Self {
            status: Text::from("Ready"),
            main_text: Text::new(),
            current_key: 0,
        }
    }

    /// The status line.
    pub fn status(&self) -> &Text {
        &self.status
    }

    /// The centered text; empty when a key is shown.
    pub fn main_text(&self) -> &Text {
        &self.main_text
    }

    /// The centered key, 0 for none.
    pub fn current_key(&self) -> u8 {
        self.current_key
    }

    /// Applies `command`, returning whether the screen must be redrawn.
    ///
    /// `SetMainText` with the current text still redraws when it hides a
    /// visible key.
    pub fn apply(&mut self, command: &DisplayCommand) -> bool {
        match command {
            DisplayCommand::SetStatus(text) => {
                if self.status == *text {
                    return false;
                }
                self.status = text.clone();
                true
            }
            DisplayCommand::SetMainText(text) => {
                // a visible key disappears even when the text is unchanged
                let hid_key = self.current_key != 0;
                self.current_key = 0;
                if self.main_text == *text {
                    return hid_key;
                }
                self.main_text = text.clone();
                true
            }
            DisplayCommand::ShowKey(key) => {
                self.current_key = *key;
                self.main_text.clear();
                true
            }
            DisplayCommand::Clear => {
                self.status.clear();
                self.main_text.clear();
                self.current_key = 0;
                true
            }
        }
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::booting()
    }
}

/// The display stage of the pipeline.
pub struct Renderer<'a, M, S>
where
    M: RawMutex,
{
    surface: S,
    commands: Receiver<'a, M, DisplayCommand, DISPLAY_QUEUE_DEPTH>,
    frame_done: &'a Signal<M, ()>,
    config: RendererConfig,
    state: DisplayState,
    frames: u32,
}

impl<'a, M, S> Renderer<'a, M, S>
where
    M: RawMutex,
    S: DisplaySurface,
{
    /// Creates a renderer showing the boot placeholder.
    pub fn new(
        surface: S,
        commands: Receiver<'a, M, DisplayCommand, DISPLAY_QUEUE_DEPTH>,
        frame_done: &'a Signal<M, ()>,
        config: RendererConfig,
    ) -> Self {
        Self {
            surface,
            commands,
            frame_done,
            config,
            state: DisplayState::booting(),
            frames: 0,
        }
    }

    /// What the screen currently shows.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Frames submitted to the surface so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Gives back the surface.
    pub fn release(self) -> S {
        self.surface
    }

    /// Powers the display up and runs the boot sequence, ending in the
    /// "Ready" state.
    pub async fn start(&mut self) -> Result<(), S::Error> {
        Timer::after(self.config.power_on_delay).await;
        self.surface.init()?;

        self.state = DisplayState::booting();
        self.redraw().await;
        Timer::after(self.config.boot_delay).await;

        self.state = DisplayState::ready();
        self.redraw().await;
        Ok(())
    }

    /// Runs the boot sequence, then renders commands forever.
    ///
    /// Returns only if the display cannot be initialized.
    pub async fn run(&mut self) {
        if self.start().await.is_err() {
            warn!("display: init failed, renderer stopped");
            return;
        }
        loop {
            self.step().await;
        }
    }

    /// Waits for one command and renders it. Returns whether it redrew.
    pub async fn step(&mut self) -> bool {
        let command = self.commands.receive().await;
        self.handle(&command).await
    }

    /// Applies `command` and redraws if anything changed.
    pub async fn handle(&mut self, command: &DisplayCommand) -> bool {
        let dirty = self.state.apply(command);
        if dirty {
            self.redraw().await;
        }
        dirty
    }

    async fn redraw(&mut self) {
        self.compose();

        self.frame_done.reset();
        if self.surface.flush().is_err() {
            warn!("display: flush failed");
        }
        self.frames = self.frames.wrapping_add(1);

        if with_timeout(self.config.frame_timeout, self.frame_done.wait())
            .await
            .is_err()
        {
            trace!("display: no frame done signal, falling back");
            Timer::after(self.config.frame_fallback).await;
        }
    }

    fn compose(&mut self) {
        let state = &self.state;
        self.surface.clear();
        self.surface
            .draw_text(0, STATUS_Y, state.status.as_bytes(), Font::Small);

        if !state.main_text.is_empty() {
            let x = centered_x(state.main_text.len(), Font::Large);
            self.surface
                .draw_text(x, MAIN_Y, state.main_text.as_bytes(), Font::Large);
        } else if state.current_key != 0 {
            self.surface
                .draw_text(KEY_X, MAIN_Y, &[state.current_key], Font::Large);
        }
    }
}

impl<M, S> fmt::Debug for Renderer<'_, M, S>
where
    M: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &self.state)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
