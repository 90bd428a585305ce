//! Energy modes
//!
//! DMA transfers keep running while the core sleeps. The self-refreshing
//! examples park the core between interrupts:
//!
//! ```no_run
//! use cortex_m::peripheral::SCB;
//! use efm32_dma::emu::{self, EnergyMode};
//!
//! fn idle(scb: &mut SCB) -> ! {
//!     loop {
//!         emu::sleep(scb, EnergyMode::Em1);
//!     }
//! }
//! ```
//!
//! The uDMA and LDMA only run in EM0 and EM1. Peripherals that wake the
//! core from EM2 or EM3 must run from a low-frequency clock; configuring
//! those clocks is up to you.

use cortex_m::peripheral::SCB;

/// Sleep depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnergyMode {
    /// Sleep. The core stops; high-frequency peripherals and DMA run.
    Em1,
    /// Deep sleep. High-frequency clocks stop; low-energy peripherals run.
    Em2,
    /// Stop. Only asynchronous and ultra-low-frequency peripherals run.
    Em3,
}

impl EnergyMode {
    /// Returns `true` if the mode needs the core's deep sleep signal.
    pub const fn is_deep(self) -> bool {
        !matches!(self, EnergyMode::Em1)
    }

    /// Returns `true` if DMA transfers keep running in this mode.
    pub const fn runs_dma(self) -> bool {
        matches!(self, EnergyMode::Em1)
    }
}

/// Enter `mode`, and return once an interrupt wakes the core.
///
/// The deep sleep signal is left as `mode` needs it.
pub fn sleep(scb: &mut SCB, mode: EnergyMode) {
    if mode.is_deep() {
        scb.set_sleepdeep();
    } else {
        scb.clear_sleepdeep();
    }
    cortex_m::asm::dsb();
    cortex_m::asm::wfi();
}
