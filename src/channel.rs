//! DMA channels
//!
//! A [`Channel`] owns one pair of descriptors, primary and alternate. You
//! describe a transfer for a slot with [`set_descriptor`](Channel::set_descriptor),
//! then arm the channel in one of two modes:
//!
//! - **basic**: one descriptor runs to completion, and the channel stops.
//!   A completion callback can re-arm it.
//! - **ping-pong**: the channel runs the primary descriptor, then the
//!   alternate, then the primary, ... The callback re-arms the slot that
//!   just finished while the other one runs, so there's no gap between
//!   descriptors.
//!
//! For more than two transfers in a row, see
//! [`activate_list`](Channel::activate_list).
//!
//! The lower-level API here is `unsafe`. The channel only knows addresses;
//! you must make sure they stay valid while the channel may run.

use crate::interrupt::{Callback, Mode};
use crate::list::DescriptorList;
use crate::transfer::Transfer;

cfg_if::cfg_if! {
    if #[cfg(feature = "ldma")] {
        mod ldma;
        pub use ldma::Channel;
    } else {
        mod udma;
        pub use udma::Channel;
    }
}

/// One of the two descriptors owned by a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    Primary,
    Alternate,
}

impl Slot {
    /// The slot that runs after this one in ping-pong mode.
    pub const fn other(self) -> Slot {
        match self {
            Slot::Primary => Slot::Alternate,
            Slot::Alternate => Slot::Primary,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Slot::Primary => 0,
            Slot::Alternate => 1,
        }
    }
}

/// Selects the hardware signal that triggers the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Configuration {
    /// No hardware trigger. The channel only runs on
    /// [`software_request`](Channel::software_request)s.
    Off,
    /// Trigger on a peripheral signal.
    ///
    /// `source` packs the source and signal selection, like the vendor's
    /// `DMAREQ_*` / `ldmaPeripheralSignal_*` constants. See [`signal`].
    ///
    /// Nothing checks that the signal exists, or that its peripheral is
    /// clocked. A bad signal never fires.
    Enable { source: u32 },
}

/// Packs a peripheral source selection and a signal selection into a
/// request value for [`Configuration::Enable`].
pub const fn signal(source_select: u32, signal_select: u32) -> u32 {
    ((source_select & 0x3F) << 16) | (signal_select & 0xF)
}

/// Channel arbitration priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    #[default]
    Default,
    High,
}

impl Channel {
    /// Returns the channel number.
    pub fn channel(&self) -> usize {
        self.index
    }

    /// Select the hardware signal that triggers this channel.
    pub fn set_channel_configuration(&mut self, configuration: Configuration) {
        self.set_channel_configuration_impl(configuration);
    }

    /// Set (`true`) or clear (`false`) the completion interrupt for this
    /// channel.
    ///
    /// A self-refreshing transfer needs the interrupt. Without it, the
    /// callback never runs and the transfer stops after the first
    /// descriptor.
    pub fn set_interrupt_on_completion(&mut self, intr: bool) {
        self.set_interrupt_on_completion_impl(intr);
    }

    /// Install the callback that runs when a descriptor completes.
    ///
    /// The callback is invoked from [`Dma::on_interrupt`](crate::Dma::on_interrupt)
    /// at any time while the channel is running, so it must be `'static`.
    pub fn set_callback(&mut self, callback: &'static dyn Callback) {
        critical_section::with(|cs| {
            let record = self.callback.borrow(cs);
            record.set(record.get().with_handler(Some(callback)));
        });
    }

    /// Remove the completion callback.
    pub fn clear_callback(&mut self) {
        critical_section::with(|cs| {
            let record = self.callback.borrow(cs);
            record.set(record.get().with_handler(None));
        });
    }

    /// Describe a transfer in `slot`, without arming it.
    ///
    /// # Safety
    ///
    /// The slot must not be running. Use this before activating the channel,
    /// or from a completion callback for the slot that just finished.
    pub unsafe fn set_descriptor(&mut self, slot: Slot, transfer: &Transfer) {
        self.write_descriptor_impl(slot, transfer, None);
    }

    /// Arm a single descriptor, and enable the channel.
    ///
    /// The next trigger starts moving elements. When all elements are moved,
    /// the channel signals completion and disables itself.
    ///
    /// # Safety
    ///
    /// `slot` must hold a transfer (see [`set_descriptor`](Self::set_descriptor))
    /// whose memory stays valid while the channel runs.
    pub unsafe fn activate_basic(&mut self, slot: Slot) {
        self.set_mode(slot, Mode::Basic);
        self.activate_basic_impl(slot);
    }

    /// Arm both descriptors in ping-pong mode, starting with the primary,
    /// and enable the channel.
    ///
    /// # Safety
    ///
    /// Both slots must hold transfers whose memory stays valid while the
    /// channel runs.
    pub unsafe fn activate_ping_pong(&mut self) {
        self.set_mode(Slot::Primary, Mode::PingPong);
        self.activate_ping_pong_impl();
    }

    /// Arm `transfers` as one chain from `list`, and enable the channel.
    ///
    /// The channel runs each transfer in order, then signals completion
    /// once, with [`Slot::Primary`], and disables itself. The callback can
    /// activate the list again; [`Completion::refresh`](crate::interrupt::Completion::refresh)
    /// only re-arms a single transfer.
    ///
    /// Peripheral transfers wait for their trigger. On the uDMA, a list
    /// whose first transfer [starts automatically](Transfer::with_auto_start)
    /// runs all of its transfers from one software request.
    ///
    /// # Safety
    ///
    /// The memory of every transfer must stay valid while the channel runs.
    /// The channel must not be running another list out of `list`.
    ///
    /// # Panics
    ///
    /// Panics if `transfers` is empty, or longer than the list.
    pub unsafe fn activate_list<const N: usize>(
        &mut self,
        list: &'static DescriptorList<N>,
        transfers: &[Transfer],
    ) {
        self.set_mode(Slot::Primary, Mode::Basic);
        self.activate_list_impl(list, transfers);
    }

    /// Rewrite the descriptor in `slot` while the channel keeps its mode.
    ///
    /// This is the ping-pong refresh: call it for the slot that just
    /// finished, while the other slot runs. With `last`, the slot runs as
    /// the final descriptor, and the channel stops after it.
    ///
    /// # Safety
    ///
    /// See [`set_descriptor`](Self::set_descriptor) and
    /// [`activate_ping_pong`](Self::activate_ping_pong).
    pub unsafe fn refresh(&mut self, slot: Slot, transfer: &Transfer, last: bool) {
        self.refresh_impl(slot, transfer, last);
    }

    /// Trigger the channel from software.
    ///
    /// Memory-to-memory transfers have no peripheral signal; use this to
    /// start them, and to restart them from a completion callback.
    pub fn software_request(&self) {
        self.software_request_impl();
    }

    /// Disable the channel. An in-progress transfer stops.
    pub fn disable(&self) {
        self.disable_impl();
    }

    /// Returns `true` if the channel is enabled.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled_impl()
    }

    /// Returns `true` if the channel's completion flag is set.
    pub fn is_interrupt(&self) -> bool {
        self.is_interrupt_impl()
    }

    /// Clear the channel's completion flag.
    pub fn clear_interrupt(&self) {
        self.clear_interrupt_impl();
    }

    /// Record the armed slot and mode for the interrupt handler.
    fn set_mode(&mut self, next: Slot, mode: Mode) {
        critical_section::with(|cs| {
            let record = self.callback.borrow(cs);
            record.set(record.get().armed(next, mode));
        });
    }
}
