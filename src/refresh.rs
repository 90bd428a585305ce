//! Transfers that run forever
//!
//! [`SelfRefresh`] is a [`Callback`] that re-arms every completed
//! descriptor with the same transfer. Start it once, and the channel keeps
//! moving data until you disable it:
//!
//! ```no_run
//! use efm32_dma::{channel::Channel, refresh::SelfRefresh, Transfer};
//!
//! const SAMPLES: usize = 32;
//! static SINE: [u16; SAMPLES] = [0; SAMPLES];
//! # const DAC_CH0DATA: *mut u16 = 0x4000_4020 as _;
//!
//! // Safety: SINE is static, and the DAC data register is always valid.
//! static REFRESH: SelfRefresh = unsafe {
//!     SelfRefresh::ping_pong(
//!         Transfer::memory_to_peripheral(SINE.as_ptr(), DAC_CH0DATA, SAMPLES),
//!         Transfer::memory_to_peripheral(SINE.as_ptr(), DAC_CH0DATA, SAMPLES),
//!     )
//! };
//!
//! fn start(channel: &mut Channel) {
//!     // Safety: REFRESH owns the transfers for the rest of the program.
//!     unsafe { REFRESH.start(channel) };
//! }
//! ```

use crate::channel::{Channel, Slot};
use crate::interrupt::{Callback, Completion};
use crate::transfer::Transfer;

/// A callback that re-arms each completed slot with a fixed transfer.
///
/// In basic mode, the primary transfer runs, and the channel is re-enabled
/// after every completion. In ping-pong mode, the primary and alternate
/// transfers take turns.
#[derive(Debug)]
pub struct SelfRefresh {
    primary: Transfer,
    alternate: Transfer,
    ping_pong: bool,
    software_trigger: bool,
}

impl SelfRefresh {
    /// Run `transfer` in basic mode, over and over.
    ///
    /// # Safety
    ///
    /// The transfer's memory must stay valid for as long as the channel
    /// runs. For a `static SelfRefresh`, that's forever.
    pub const unsafe fn basic(transfer: Transfer) -> Self {
        SelfRefresh {
            primary: transfer,
            alternate: transfer,
            ping_pong: false,
            software_trigger: false,
        }
    }

    /// Alternate between `primary` and `alternate` in ping-pong mode.
    ///
    /// # Safety
    ///
    /// See [`basic`](Self::basic).
    pub const unsafe fn ping_pong(primary: Transfer, alternate: Transfer) -> Self {
        SelfRefresh {
            primary,
            alternate,
            ping_pong: true,
            software_trigger: false,
        }
    }

    /// Issue a software request after starting, and after each refresh.
    ///
    /// Memory-to-memory transfers have no peripheral to trigger them.
    pub const fn with_software_trigger(mut self) -> Self {
        self.software_trigger = true;
        self
    }

    /// The transfer that `slot` runs.
    pub const fn transfer(&self, slot: Slot) -> &Transfer {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Alternate => &self.alternate,
        }
    }

    /// Returns `true` if this runs in ping-pong mode.
    pub const fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Describe the transfers, install this callback, enable the completion
    /// interrupt, and arm the channel.
    ///
    /// The channel's trigger should already be configured.
    ///
    /// # Safety
    ///
    /// The channel must be idle. Nothing else may rewrite its descriptors
    /// while it runs.
    pub unsafe fn start(&'static self, channel: &mut Channel) {
        channel.set_descriptor(Slot::Primary, &self.primary);
        channel.set_callback(self);
        channel.set_interrupt_on_completion(true);
        if self.ping_pong {
            channel.set_descriptor(Slot::Alternate, &self.alternate);
            channel.activate_ping_pong();
        } else {
            channel.activate_basic(Slot::Primary);
        }
        if self.software_trigger {
            channel.software_request();
        }
    }
}

impl Callback for SelfRefresh {
    fn complete(&self, completion: &mut Completion<'_>) {
        let transfer = self.transfer(completion.slot());
        // Safety: the transfers are valid for as long as we're installed.
        // See the constructors.
        unsafe { completion.refresh(transfer) };
        if self.software_trigger {
            completion.software_request();
        }
    }
}
