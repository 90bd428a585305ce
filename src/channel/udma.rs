//! Channel definition, implementation, for the uDMA.

use crate::interrupt::SharedCallback;
use crate::list::DescriptorList;
use crate::ral::{self, descriptor, udma, Static};
use crate::transfer::{Increment, Transfer};
use crate::Error;

use super::{Configuration, Priority, Slot};

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
        assert!(index < CHANNELS && index < udma::CHANNELS);
        Channel {
            index,
            registers: self.controller,
            descriptors: self.descriptors,
            callback: &self.callbacks[index],
        }
    }

    pub(crate) fn init_impl(&self) {
        let dma = &self.controller;
        dma.CHENC.write(u32::MAX);
        ral::write_reg!(ral::udma, dma, CONFIG, EN: 1);
        dma.CTRLBASE.write(self.descriptors.0 as usize as u32);
        dma.IFC.write(u32::MAX);
        ral::write_reg!(ral::udma, dma, IEN, ERR: 1);
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
        if pending & udma::IF::ERR::mask == 0 {
            return None;
        }
        let status = dma.STATUS.read();
        ral::write_reg!(ral::udma, dma, ERRORC, ERRORC: 1);
        Some(Error::new(status, None))
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
    /// Our channel number, expected to be between [0, 12)
    pub(super) index: usize,
    /// Reference to the DMA registers
    registers: Static<udma::RegisterBlock>,
    /// Reference to the control block
    descriptors: Static<descriptor::udma::Table>,
    /// This channel's callback record.
    pub(crate) callback: &'static SharedCallback,
}

impl Channel {
    fn mask(&self) -> u32 {
        1 << self.index
    }

    fn descriptor(&self, slot: Slot) -> &descriptor::udma::Descriptor {
        match slot {
            Slot::Primary => &self.descriptors.primary[self.index],
            Slot::Alternate => &self.descriptors.alternate[self.index],
        }
    }

    /// Set the channel's arbitration priority.
    ///
    /// High priority channels win arbitration over default priority
    /// channels. Within a priority level, lower channel numbers win.
    ///
    /// Note: This method is not available for LDMA.
    pub fn set_priority(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.registers.CHPRIS.write(self.mask()),
            Priority::Default => self.registers.CHPRIC.write(self.mask()),
        }
    }

    /// Reload the descriptor count in hardware after each completion.
    ///
    /// With `Some(count)`, a completed descriptor starts over with `count`
    /// elements, and keeps its cycle mode. A ping-pong pair then loops
    /// without a callback rewriting descriptors. `None` turns looping off.
    ///
    /// Note: This method is not available for LDMA.
    ///
    /// # Panics
    ///
    /// Only channels 0 and 1 have loop registers. Panics for any other
    /// channel, or if `count` is out of range.
    pub fn set_loop(&mut self, count: Option<usize>) {
        assert!(
            self.index < 2,
            "Requested DMA looping on an unsupported channel."
        );
        let value = match count {
            Some(count) => {
                assert!(count > 0 && count <= crate::MAX_TRANSFER_COUNT);
                udma::LOOP0::EN::mask | (count as u32 - 1) << udma::LOOP0::WIDTH::offset
            }
            None => 0,
        };
        match self.index {
            0 => self.registers.LOOP0.write(value),
            _ => self.registers.LOOP1.write(value),
        }
    }

    /// The slot the controller uses for the next (or current) transfer.
    ///
    /// Note: This method is not available for LDMA.
    pub fn active_slot(&self) -> Slot {
        if self.registers.CHALTS.read() & self.mask() != 0 {
            Slot::Alternate
        } else {
            Slot::Primary
        }
    }

    /// Write all of `slot`'s descriptor. `cycle` is the cycle control to
    /// arm with; `None` leaves the descriptor invalid.
    pub(super) fn write_descriptor_impl(
        &mut self,
        slot: Slot,
        transfer: &Transfer,
        cycle: Option<u32>,
    ) {
        encode(
            self.descriptor(slot),
            transfer,
            cycle.unwrap_or(descriptor::udma::CTRL::CYCLE_CTRL::RW::INVALID),
        );
    }

    fn set_cycle(&self, slot: Slot, cycle: u32) {
        let descr = self.descriptor(slot);
        ral::modify_reg!(descriptor::udma, descr, CTRL, CYCLE_CTRL: cycle);
    }

    fn select(&self, slot: Slot) {
        match slot {
            Slot::Primary => self.registers.CHALTC.write(self.mask()),
            Slot::Alternate => self.registers.CHALTS.write(self.mask()),
        }
    }

    pub(super) fn activate_basic_impl(&mut self, slot: Slot) {
        use descriptor::udma::CTRL::CYCLE_CTRL::RW::{AUTO, BASIC};
        let auto = self.descriptor(slot).USER.read() & AUTO_START != 0;
        self.registers.CHUSEBURSTC.write(self.mask());
        self.set_cycle(slot, if auto { AUTO } else { BASIC });
        self.select(slot);
        self.enable_impl();
        if auto {
            self.software_request_impl();
        }
    }

    /// Run `transfers` as scatter-gather tasks from `list`.
    ///
    /// The primary descriptor copies one task at a time into the alternate
    /// descriptor, which then runs it. If the first transfer starts
    /// automatically, the list runs in memory scatter-gather mode, and one
    /// software request runs every task. Otherwise, each task waits for
    /// peripheral requests.
    pub(super) fn activate_list_impl<const N: usize>(
        &mut self,
        list: &'static DescriptorList<N>,
        transfers: &[Transfer],
    ) {
        use descriptor::udma::CTRL::CYCLE_CTRL::RW::*;
        assert!(!transfers.is_empty() && transfers.len() <= N);
        assert!(
            4 * transfers.len() <= crate::MAX_TRANSFER_COUNT,
            "Scatter-gather lists hold at most 256 tasks."
        );

        let memory = transfers[0].is_auto_start();
        let (gather, task, finish) = if memory {
            (MEM_SG, ALT_MEM_SG, AUTO)
        } else {
            (PER_SG, ALT_PER_SG, BASIC)
        };

        let tasks = list.as_ptr().cast::<descriptor::udma::Descriptor>();
        let last = transfers.len() - 1;
        for (idx, transfer) in transfers.iter().enumerate() {
            // Safety: idx < N, and the list is sized and aligned for N
            // descriptors.
            let entry = unsafe { &*tasks.add(idx) };
            encode(entry, transfer, if idx == last { finish } else { task });
        }

        // The primary moves four words per task, ending on the alternate's
        // USER word.
        let words = 4 * transfers.len() as u32;
        let alternate = &self.descriptor(Slot::Alternate).USER as *const _ as usize as u32;
        let primary = self.descriptor(Slot::Primary);
        primary
            .SRCEND
            .write(list.as_ptr() as usize as u32 + 4 * (words - 1));
        primary.DSTEND.write(alternate);
        ral::write_reg!(
            descriptor::udma,
            primary,
            CTRL,
            DST_INC: WORD,
            DST_SIZE: WORD,
            SRC_INC: WORD,
            SRC_SIZE: WORD,
            R_POWER: 2,
            N_MINUS_1: words - 1,
            CYCLE_CTRL: gather
        );
        primary.USER.write(0);

        self.registers.CHUSEBURSTC.write(self.mask());
        self.select(Slot::Primary);
        self.enable_impl();
        if memory {
            self.software_request_impl();
        }
    }

    pub(super) fn activate_ping_pong_impl(&mut self) {
        use descriptor::udma::CTRL::CYCLE_CTRL::RW::PINGPONG;
        self.registers.CHUSEBURSTC.write(self.mask());
        self.set_cycle(Slot::Alternate, PINGPONG);
        self.set_cycle(Slot::Primary, PINGPONG);
        self.select(Slot::Primary);
        self.enable_impl();
    }

    pub(super) fn refresh_impl(&mut self, slot: Slot, transfer: &Transfer, last: bool) {
        use descriptor::udma::CTRL::CYCLE_CTRL::RW::{BASIC, PINGPONG};
        self.write_descriptor_impl(slot, transfer, Some(if last { BASIC } else { PINGPONG }));
    }

    pub(super) fn set_channel_configuration_impl(&mut self, configuration: Configuration) {
        // Immutable write OK. 32-bit store on this channel's control register.
        let source = match configuration {
            Configuration::Off => 0,
            Configuration::Enable { source } => source,
        };
        let ctrl = &self.registers.CH[self.index];
        ral::write_reg!(
            ral::udma,
            ctrl,
            CTRL,
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
        // Immutable write OK. Set / clear registers only touch our bit.
        self.registers.CHENS.write(self.mask());
    }

    pub(super) fn disable_impl(&self) {
        self.registers.CHENC.write(self.mask());
    }

    pub(super) fn software_request_impl(&self) {
        self.registers.CHSWREQ.write(self.mask());
    }

    pub(super) fn is_enabled_impl(&self) -> bool {
        self.registers.CHENS.read() & self.mask() != 0
    }

    pub(super) fn is_interrupt_impl(&self) -> bool {
        self.registers.IF.read() & self.mask() != 0
    }

    pub(super) fn clear_interrupt_impl(&self) {
        // Immutable write OK. IFC only clears our bit.
        self.registers.IFC.write(self.mask());
    }
}

/// USER word flag: the descriptor starts without a peripheral request.
const AUTO_START: u32 = 1;

/// Write all words of `descr` for `transfer`, armed with `cycle`.
fn encode(descr: &descriptor::udma::Descriptor, transfer: &Transfer, cycle: u32) {
    let size = transfer.element_size().log2();
    let increment = |increment: Increment| match increment {
        Increment::Fixed => descriptor::udma::CTRL::SRC_INC::RW::NONE,
        Increment::Element => size,
    };

    descr.SRCEND.write(transfer.source_end());
    descr.DSTEND.write(transfer.destination_end());
    ral::write_reg!(
        descriptor::udma,
        descr,
        CTRL,
        DST_INC: increment(transfer.destination_increment()),
        DST_SIZE: size,
        SRC_INC: increment(transfer.source_increment()),
        SRC_SIZE: size,
        R_POWER: transfer.arbitration().log2(),
        N_MINUS_1: transfer.count_minus_one(),
        CYCLE_CTRL: cycle
    );
    descr.USER.write(if transfer.is_auto_start() {
        AUTO_START
    } else {
        0
    });
}
