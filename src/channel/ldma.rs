//! Channel definitions, implementation, for LDMA.
//!
//! LDMA doesn't have primary and alternate descriptors. Instead, a channel
//! loads a descriptor from memory, and follows the descriptor's link when
//! it's done. Each channel owns two adjacent descriptors in the control
//! block. Ping-pong mode links them to each other: the primary links one
//! descriptor forward, and the alternate links one descriptor back.

use crate::interrupt::{Mode, SharedCallback};
use crate::list::DescriptorList;
use crate::ral::{self, descriptor, ldma, Static};
use crate::transfer::{Increment, Transfer};
use crate::Error;

use super::{Configuration, Slot};

/// Size of one descriptor, in bytes.
const DESCRIPTOR_SIZE: i32 = core::mem::size_of::<descriptor::ldma::Descriptor>() as i32;

impl<const CHANNELS: usize> crate::Dma<CHANNELS> {
    /// Creates the DMA channel described by `index`.
    ///
    /// # Safety
    ///
    /// This will create a handle that may alias global, mutable state. You should only create
    /// one channel per index. If there are multiple channels for the same index, you're
    /// responsible for ensuring synchronized access.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than or equal to the maximum number of channels.
    pub unsafe fn channel(&'static self, index: usize) -> Channel {
        assert!(index < CHANNELS && index < ldma::CHANNELS);
        Channel {
            index,
            registers: self.controller,
            descriptors: self.descriptors,
            callback: &self.callbacks[index],
        }
    }

    pub(crate) fn init_impl(&self) {
        let dma = &self.controller;
        dma.CTRL.write(0);
        dma.CHEN.write(0);
        dma.DBGHALT.write(0);
        dma.REQDIS.write(0);
        dma.IFC.write(u32::MAX);
        ral::write_reg!(ral::ldma, dma, IEN, ERROR: 1);
    }

    /// Completion flags of enabled channels, plus the error flag. Clears
    /// them in one write.
    pub(crate) fn take_pending_impl(&self) -> u32 {
        let pending = self.controller.IF.read() & self.controller.IEN.read();
        self.controller.IFC.write(pending);
        pending
    }

    pub(crate) fn take_error_impl(&self, pending: u32) -> Option<Error> {
        let dma = &self.controller;
        if pending & ldma::IF::ERROR::mask == 0 {
            return None;
        }
        let status = dma.STATUS.read();
        let channel = ral::read_reg!(ral::ldma, dma, STATUS, CHERROR);
        Some(Error::new(status, Some(channel as u8)))
    }
}

/// A DMA channel
///
/// You should rely on your HAL to allocate `Channel`s. If your HAL does not allocate channels,
/// or if you're desigining the HAL, use [`Dma`](crate::Dma) to create channels.
///
/// The `Channel` stores memory addresses independent of the memory lifetime. You must make
/// sure that the channel's state is valid before enabling a transfer!
pub struct Channel {
    /// Our channel number, expected to be between [0, 8)
    pub(super) index: usize,
    /// Reference to the DMA registers
    registers: Static<ldma::RegisterBlock>,
    /// Reference to the descriptor table
    descriptors: Static<descriptor::ldma::Table>,
    /// This channel's callback record.
    pub(crate) callback: &'static SharedCallback,
}

impl Channel {
    fn mask(&self) -> u32 {
        1 << self.index
    }

    fn channel_registers(&self) -> &ldma::ChannelRegisters {
        &self.registers.CH[self.index]
    }

    fn descriptor(&self, slot: Slot) -> &descriptor::ldma::Descriptor {
        &self.descriptors.pairs[self.index][slot.index()]
    }

    /// Link `slot` to the descriptor `step` descriptors away, relative
    /// to itself. `None` ends the list after `slot`.
    fn set_link(&self, slot: Slot, step: Option<i32>) {
        link(self.descriptor(slot), step);
    }

    /// Load the descriptor at `address` into the channel, and enable it.
    fn load(&self, address: u32) {
        let chdone = self.registers.CHDONE.read();
        self.registers.CHDONE.write(chdone & !self.mask());
        // Descriptors are word aligned, so this is an absolute link.
        self.channel_registers().LINK.write(address);
        self.enable_impl();
        self.registers.LINKLOAD.write(self.mask());
    }

    fn load_slot(&self, slot: Slot) {
        self.load(self.descriptor(slot) as *const _ as usize as u32);
    }

    /// Returns `true` if the channel finished its last descriptor.
    ///
    /// Note: This method is not available for the uDMA.
    pub fn is_complete(&self) -> bool {
        self.registers.CHDONE.read() & self.mask() != 0
    }

    /// Arm one descriptor that links to itself, and enable the channel.
    ///
    /// The descriptor runs again each time it completes, without any
    /// interrupt. A completion callback is still invoked if the completion
    /// interrupt is enabled.
    ///
    /// Note: This method is not available for the uDMA.
    ///
    /// # Safety
    ///
    /// `slot` must hold a transfer whose memory stays valid while the channel
    /// runs.
    pub unsafe fn activate_looped(&mut self, slot: Slot) {
        self.set_mode(slot, Mode::Looped);
        self.set_link(slot, Some(0));
        self.load_slot(slot);
    }

    /// Arm a list of transfers whose last entry links back to the first,
    /// and enable the channel.
    ///
    /// The channel runs the list over and over. If the completion interrupt
    /// is enabled, the callback runs once per pass, with
    /// [`Slot::Primary`].
    ///
    /// Note: This method is not available for the uDMA.
    ///
    /// # Safety
    ///
    /// See [`activate_list`](Self::activate_list).
    ///
    /// # Panics
    ///
    /// Panics if `transfers` is empty, or longer than the list.
    pub unsafe fn activate_looped_list<const N: usize>(
        &mut self,
        list: &'static DescriptorList<N>,
        transfers: &[Transfer],
    ) {
        self.set_mode(Slot::Primary, Mode::Looped);
        self.write_list(list, transfers, true);
    }

    /// Write all of `slot`'s descriptor. `link` is the relative link to
    /// the next descriptor; `None` makes `slot` the last one.
    pub(super) fn write_descriptor_impl(
        &mut self,
        slot: Slot,
        transfer: &Transfer,
        link: Option<i32>,
    ) {
        encode(self.descriptor(slot), transfer, true);
        self.set_link(slot, link);
    }

    pub(super) fn activate_basic_impl(&mut self, slot: Slot) {
        self.set_link(slot, None);
        self.load_slot(slot);
    }

    pub(super) fn activate_ping_pong_impl(&mut self) {
        self.set_link(Slot::Primary, Some(1));
        self.set_link(Slot::Alternate, Some(-1));
        self.load_slot(Slot::Primary);
    }

    pub(super) fn activate_list_impl<const N: usize>(
        &mut self,
        list: &'static DescriptorList<N>,
        transfers: &[Transfer],
    ) {
        self.write_list(list, transfers, false);
    }

    /// Write `transfers` into `list`, each entry linking to the next, and
    /// load the first entry. Only the last entry signals completion.
    fn write_list<const N: usize>(
        &mut self,
        list: &'static DescriptorList<N>,
        transfers: &[Transfer],
        looped: bool,
    ) {
        assert!(!transfers.is_empty() && transfers.len() <= N);
        let entries = list.as_ptr().cast::<descriptor::ldma::Descriptor>();
        let last = transfers.len() - 1;
        for (idx, transfer) in transfers.iter().enumerate() {
            // Safety: idx < N, and the list is sized and aligned for N
            // descriptors.
            let entry = unsafe { &*entries.add(idx) };
            encode(entry, transfer, idx == last);
            let step = match (idx == last, looped) {
                (false, _) => Some(1),
                (true, true) => Some(-(last as i32)),
                (true, false) => None,
            };
            link(entry, step);
        }
        self.load(list.as_ptr() as usize as u32);
    }

    pub(super) fn refresh_impl(&mut self, slot: Slot, transfer: &Transfer, last: bool) {
        // Keep the slot's link, unless it's the last descriptor.
        let link = self.descriptor(slot).LINK.read();
        self.write_descriptor_impl(slot, transfer, None);
        if !last {
            self.descriptor(slot).LINK.write(link);
        }
    }

    pub(super) fn set_channel_configuration_impl(&mut self, configuration: Configuration) {
        let source = match configuration {
            Configuration::Off => 0,
            Configuration::Enable { source } => source,
        };
        let chan = self.channel_registers();
        ral::write_reg!(
            ral::ldma,
            chan,
            REQSEL,
            SOURCESEL: source >> 16,
            SIGSEL: source
        );
    }

    pub(super) fn set_interrupt_on_completion_impl(&mut self, intr: bool) {
        self.registers.IFC.write(self.mask());
        let ien = self.registers.IEN.read();
        if intr {
            self.registers.IEN.write(ien | self.mask());
        } else {
            self.registers.IEN.write(ien & !self.mask());
        }
    }

    pub(super) fn enable_impl(&self) {
        // Single-cycle RMW on hardware. Immutable write still OK: channel
        // deemed unique, and it should be !Sync.
        let chen = self.registers.CHEN.read();
        self.registers.CHEN.write(chen | self.mask());
    }

    pub(super) fn disable_impl(&self) {
        let chen = self.registers.CHEN.read();
        self.registers.CHEN.write(chen & !self.mask());
    }

    pub(super) fn software_request_impl(&self) {
        self.registers.SWREQ.write(self.mask());
    }

    pub(super) fn is_enabled_impl(&self) -> bool {
        self.registers.CHEN.read() & self.mask() != 0
    }

    pub(super) fn is_interrupt_impl(&self) -> bool {
        self.registers.IF.read() & self.mask() != 0
    }

    pub(super) fn clear_interrupt_impl(&self) {
        self.registers.IFC.write(self.mask());
    }
}

/// Write the `CTRL`, `SRC` and `DST` words of `descr` for `transfer`.
/// `done` sets the completion flag when the descriptor finishes.
fn encode(descr: &descriptor::ldma::Descriptor, transfer: &Transfer, done: bool) {
    let increment = |increment: Increment| match increment {
        Increment::Fixed => descriptor::ldma::CTRL::SRCINC::RW::NONE,
        Increment::Element => descriptor::ldma::CTRL::SRCINC::RW::ONE,
    };
    let auto = transfer.is_auto_start();

    descr.SRC.write(transfer.source() as usize as u32);
    descr.DST.write(transfer.destination() as usize as u32);
    ral::write_reg!(
        descriptor::ldma,
        descr,
        CTRL,
        STRUCTTYPE: TRANSFER,
        STRUCTREQ: auto as u32,
        XFERCNT: transfer.count_minus_one(),
        BLOCKSIZE: block_size(transfer),
        DONEIFSEN: done as u32,
        REQMODE: if auto { ALL } else { BLOCK },
        SRCINC: increment(transfer.source_increment()),
        SIZE: transfer.element_size().log2(),
        DSTINC: increment(transfer.destination_increment())
    );
}

/// Link `descr` to the descriptor `step` descriptors away. `None` ends the
/// list at `descr`.
fn link(descr: &descriptor::ldma::Descriptor, step: Option<i32>) {
    match step {
        Some(step) => ral::write_reg!(
            descriptor::ldma,
            descr,
            LINK,
            LINKMODE: RELATIVE,
            LINK: 1,
            LINKADDR: ((step * DESCRIPTOR_SIZE) as u32) >> 2
        ),
        None => descr.LINK.write(0),
    }
}

/// The block size field for the transfer's arbitration rate.
///
/// Block sizes aren't all powers of two. Every arbitration rate has an
/// exact match, though.
fn block_size(transfer: &Transfer) -> u32 {
    match transfer.arbitration().log2() {
        // 1, 2 -> UNIT1, UNIT2
        log2 @ 0..=1 => log2,
        // 4 -> UNIT4
        2 => 3,
        // 8 -> UNIT8
        3 => 5,
        // 16 -> UNIT16
        4 => 7,
        // 32, 64, ..., 1024 -> UNIT32, UNIT64, ..., UNIT1024
        log2 => log2 + 4,
    }
}
