//! Testing utilities and controller models
//!
//! This module provides host-memory models of the DMA controllers, the flash
//! controller and a NOR flash, so that drivers run under `cargo test`
//! without hardware.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs, dead_code)]

extern crate std;

use std::alloc::{alloc_zeroed, Layout};
use std::boxed::Box;
use std::vec;
use std::vec::Vec;

use crate::msc::{self, Flash};
use crate::{DescriptorList, Dma};

// =============================================================================
// Register blocks
// =============================================================================

/// Zeroed, word-aligned memory standing in for a peripheral register block.
///
/// Reads and writes go through raw pointers, like the driver's register
/// accesses.
pub struct Block {
    ptr: *mut u32,
    words: usize,
}

impl Block {
    pub fn new(bytes: usize) -> Self {
        let words = bytes.div_ceil(4);
        let ptr = Box::into_raw(vec![0u32; words].into_boxed_slice()).cast::<u32>();
        Block { ptr, words }
    }

    /// Pointer to hand to a driver constructor.
    pub fn ptr(&self) -> *const () {
        self.ptr.cast_const().cast()
    }

    /// Read the register at byte `offset`.
    pub fn read(&self, offset: usize) -> u32 {
        assert!(offset % 4 == 0 && offset / 4 < self.words);
        unsafe { self.ptr.add(offset / 4).read_volatile() }
    }

    /// Write the register at byte `offset`.
    pub fn write(&self, offset: usize, value: u32) {
        assert!(offset % 4 == 0 && offset / 4 < self.words);
        unsafe { self.ptr.add(offset / 4).write_volatile(value) }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let slice = core::ptr::slice_from_raw_parts_mut(self.ptr, self.words);
        drop(unsafe { Box::from_raw(slice) });
    }
}

// =============================================================================
// DMA-visible memory
// =============================================================================

pub const ARENA_SIZE: usize = 0x1_0000;

/// Memory that the DMA models can address with 32-bit pointers.
///
/// Descriptors hold 32-bit addresses. The arena is aligned to its size, so
/// every address inside it shares the same upper bits, and a 32-bit address
/// maps back to a host pointer.
///
/// Control blocks, buffers and "peripheral" registers that DMA touches all
/// live here. The arena is leaked; `Dma` objects point into it forever.
pub struct Arena {
    base: *mut u8,
}

impl Arena {
    pub fn new() -> &'static Self {
        let layout = Layout::from_size_align(ARENA_SIZE, ARENA_SIZE).unwrap();
        let base = unsafe { alloc_zeroed(layout) };
        assert!(!base.is_null());
        Box::leak(Box::new(Arena { base }))
    }

    /// Pointer to the `T` at byte `offset`.
    pub fn at<T>(&self, offset: usize) -> *mut T {
        assert!(offset < ARENA_SIZE && offset % core::mem::align_of::<T>() == 0);
        unsafe { self.base.add(offset).cast() }
    }

    /// The 32-bit address of byte `offset`, as the DMA sees it.
    pub fn address(&self, offset: usize) -> u32 {
        self.at::<u8>(offset) as usize as u32
    }

    pub fn upper(&self) -> u64 {
        self.base as usize as u64 & !0xFFFF_FFFF
    }

    pub fn fill<T: Copy>(&self, offset: usize, values: &[T]) {
        let dst = self.at::<T>(offset);
        for (idx, value) in values.iter().enumerate() {
            unsafe { dst.add(idx).write_volatile(*value) };
        }
    }

    pub fn load<T: Copy>(&self, offset: usize, len: usize) -> Vec<T> {
        let src = self.at::<T>(offset);
        (0..len)
            .map(|idx| unsafe { src.add(idx).read_volatile() })
            .collect()
    }
}

/// Moves one element between two DMA addresses, as the controller would.
fn copy_element(upper: u64, source: u32, destination: u32, size: u32) -> u32 {
    let src = (upper | source as u64) as usize;
    let dst = (upper | destination as u64) as usize;
    unsafe {
        match size {
            0 => {
                let value = (src as *const u8).read_volatile();
                (dst as *mut u8).write_volatile(value);
                value as u32
            }
            1 => {
                let value = (src as *const u16).read_volatile();
                (dst as *mut u16).write_volatile(value);
                value as u32
            }
            _ => {
                let value = (src as *const u32).read_volatile();
                (dst as *mut u32).write_volatile(value);
                value
            }
        }
    }
}

fn read_word(upper: u64, address: u32) -> u32 {
    unsafe { ((upper | address as u64) as usize as *const u32).read_volatile() }
}

fn write_word(upper: u64, address: u32, value: u32) {
    unsafe { ((upper | address as u64) as usize as *mut u32).write_volatile(value) }
}

/// Records every element written to one address.
#[derive(Default)]
struct Sink {
    address: Option<u32>,
    samples: Vec<u32>,
}

impl Sink {
    fn observe(&mut self, destination: u32, value: u32) {
        if self.address == Some(destination) {
            self.samples.push(value);
        }
    }
}

// =============================================================================
// uDMA model
// =============================================================================

mod udma_regs {
    pub const STATUS: usize = 0x000;
    pub const CTRLBASE: usize = 0x008;
    pub const CHSWREQ: usize = 0x014;
    pub const CHUSEBURSTS: usize = 0x018;
    pub const CHUSEBURSTC: usize = 0x01C;
    pub const CHREQMASKS: usize = 0x020;
    pub const CHREQMASKC: usize = 0x024;
    pub const CHENS: usize = 0x028;
    pub const CHENC: usize = 0x02C;
    pub const CHALTS: usize = 0x030;
    pub const CHALTC: usize = 0x034;
    pub const CHPRIS: usize = 0x038;
    pub const CHPRIC: usize = 0x03C;
    pub const IF: usize = 0x1000;
    pub const IFC: usize = 0x1008;
    pub const LOOP0: usize = 0x1020;
    pub const LOOP1: usize = 0x1024;
    pub const CH: usize = 0x1100;
    pub const SIZE: usize = 0x1130;
}

/// A model of the uDMA controller.
///
/// Set / clear register pairs are applied by [`sync`](Udma::sync), which
/// every simulation step calls first. Call it yourself after driver calls
/// when you want to look at channel state.
///
/// Write-only command registers (set / clear pairs, `CHSWREQ`, `IFC`) hold
/// only the last value written between two syncs. On hardware, each write
/// takes effect on its own; drivers here write each of them once per
/// operation.
pub struct Udma {
    registers: Block,
    upper: u64,
    enabled: u32,
    alternate: u32,
    priority: u32,
    useburst: u32,
    reqmask: u32,
    requests: u32,
    flags: u32,
    sink: Sink,
}

impl Udma {
    pub fn new(arena: &Arena) -> Self {
        Udma {
            registers: Block::new(udma_regs::SIZE),
            upper: arena.upper(),
            enabled: 0,
            alternate: 0,
            priority: 0,
            useburst: 0,
            reqmask: 0,
            requests: 0,
            flags: 0,
            sink: Sink::default(),
        }
    }

    pub fn registers(&self) -> &Block {
        &self.registers
    }

    fn pair(&self, state: u32, set: usize, clear: usize) -> u32 {
        let state = (state | self.registers.read(set)) & !self.registers.read(clear);
        self.registers.write(set, state);
        self.registers.write(clear, 0);
        state
    }

    pub fn sync(&mut self) {
        use udma_regs::*;
        self.enabled = self.pair(self.enabled, CHENS, CHENC);
        self.alternate = self.pair(self.alternate, CHALTS, CHALTC);
        self.priority = self.pair(self.priority, CHPRIS, CHPRIC);
        self.useburst = self.pair(self.useburst, CHUSEBURSTS, CHUSEBURSTC);
        self.reqmask = self.pair(self.reqmask, CHREQMASKS, CHREQMASKC);

        self.requests |= self.registers.read(CHSWREQ);
        self.registers.write(CHSWREQ, 0);

        self.flags &= !self.registers.read(IFC);
        self.registers.write(IFC, 0);
        self.registers.write(IF, self.flags);
    }

    /// A peripheral requests channel `channel`.
    pub fn trigger(&mut self, channel: usize) {
        self.sync();
        self.arbitrate(channel);
    }

    /// Serve pending software requests.
    pub fn step(&mut self) {
        self.sync();
        for channel in 0..32 {
            let mask = 1 << channel;
            if self.requests & mask != 0 {
                self.requests &= !mask;
                self.arbitrate(channel);
            }
        }
    }

    pub fn raise_error(&mut self, _channel: usize) {
        self.registers.write(udma_regs::STATUS, 0x0000_0B01);
        self.flags |= 1 << 31;
        self.registers.write(udma_regs::IF, self.flags);
    }

    pub fn is_alternate(&mut self, channel: usize) -> bool {
        self.sync();
        self.alternate & (1 << channel) != 0
    }

    pub fn is_high_priority(&mut self, channel: usize) -> bool {
        self.sync();
        self.priority & (1 << channel) != 0
    }

    pub fn channel_control(&self, channel: usize) -> u32 {
        self.registers.read(udma_regs::CH + 4 * channel)
    }

    pub fn watch(&mut self, address: u32) {
        self.sink.address = Some(address);
    }

    pub fn samples(&self) -> &[u32] {
        &self.sink.samples
    }

    fn descriptor(&self, channel: usize, alternate: bool) -> u32 {
        let base = self.registers.read(udma_regs::CTRLBASE);
        base + 16 * channel as u32 + if alternate { 0x100 } else { 0 }
    }

    fn loop_width(&self, channel: usize) -> Option<u32> {
        let reg = match channel {
            0 => self.registers.read(udma_regs::LOOP0),
            1 => self.registers.read(udma_regs::LOOP1),
            _ => return None,
        };
        (reg & (1 << 16) != 0).then_some(reg & 0x3FF)
    }

    fn disable(&mut self, mask: u32) {
        self.enabled &= !mask;
        self.registers.write(udma_regs::CHENS, self.enabled);
    }

    fn select(&mut self, mask: u32, alternate: bool) {
        if alternate {
            self.alternate |= mask;
        } else {
            self.alternate &= !mask;
        }
        self.registers.write(udma_regs::CHALTS, self.alternate);
    }

    /// Serve one request. Auto cycles move every element, and memory
    /// scatter-gather keeps going until the last task is done.
    fn arbitrate(&mut self, channel: usize) {
        let mask = 1 << channel;
        if self.enabled & mask == 0 || self.reqmask & mask != 0 {
            return;
        }
        loop {
            let alternate = self.alternate & mask != 0;
            let descriptor = self.descriptor(channel, alternate);
            let ctrl = read_word(self.upper, descriptor + 8);
            let cycle = ctrl & 0x7;
            match cycle {
                0 => {
                    self.disable(mask);
                    return;
                }
                4 | 6 if !alternate => {
                    self.gather(channel, descriptor, ctrl);
                    continue;
                }
                _ => {}
            }

            let remaining = ((ctrl >> 4) & 0x3FF) + 1;
            let burst = match cycle {
                2 | 5 => remaining,
                _ => (1u32 << ((ctrl >> 14) & 0xF)).min(remaining),
            };
            self.move_elements(descriptor, ctrl, remaining, burst);

            let remaining = remaining - burst;
            if remaining > 0 {
                let ctrl = (ctrl & !(0x3FF << 4)) | ((remaining - 1) << 4);
                write_word(self.upper, descriptor + 8, ctrl);
                return;
            }

            if cycle == 5 || cycle == 7 {
                write_word(self.upper, descriptor + 8, ctrl & !(0x3FF << 4) & !0x7);
                self.select(mask, false);
                if cycle == 5 {
                    continue;
                }
                return;
            }

            let looped = self.loop_width(channel);
            let ctrl = match looped {
                Some(width) => (ctrl & !(0x3FF << 4)) | (width << 4),
                None => ctrl & !(0x3FF << 4) & !0x7,
            };
            write_word(self.upper, descriptor + 8, ctrl);
            self.flags |= mask;
            self.registers.write(udma_regs::IF, self.flags);

            if cycle == 3 {
                self.select(mask, !alternate);
                let next = self.descriptor(channel, !alternate);
                if read_word(self.upper, next + 8) & 0x7 == 0 {
                    self.disable(mask);
                }
            } else if looped.is_none() {
                self.disable(mask);
            }
            return;
        }
    }

    fn move_elements(&mut self, descriptor: u32, ctrl: u32, remaining: u32, burst: u32) {
        let size = (ctrl >> 24) & 0x3;
        let src_inc = (ctrl >> 26) & 0x3;
        let dst_inc = (ctrl >> 30) & 0x3;
        let src_end = read_word(self.upper, descriptor);
        let dst_end = read_word(self.upper, descriptor + 4);
        let at = |end: u32, inc: u32, left: u32| if inc == 3 { end } else { end - (left << inc) };

        for idx in 0..burst {
            let left = remaining - 1 - idx;
            let destination = at(dst_end, dst_inc, left);
            let value = copy_element(self.upper, at(src_end, src_inc, left), destination, size);
            self.sink.observe(destination, value);
        }
    }

    /// Copy the next scatter-gather task into the alternate descriptor, and
    /// switch to it.
    fn gather(&mut self, channel: usize, primary: u32, ctrl: u32) {
        let remaining = ((ctrl >> 4) & 0x3FF) + 1;
        let src_end = read_word(self.upper, primary);
        let alternate = self.descriptor(channel, true);
        for word in 0..4 {
            let left = remaining - 1 - word;
            let value = read_word(self.upper, src_end - 4 * left);
            write_word(self.upper, alternate + 4 * word, value);
        }

        let remaining = remaining - 4;
        let ctrl = if remaining > 0 {
            (ctrl & !(0x3FF << 4)) | ((remaining - 1) << 4)
        } else {
            ctrl & !(0x3FF << 4) & !0x7
        };
        write_word(self.upper, primary + 8, ctrl);
        self.select(1 << channel, true);
    }
}

// =============================================================================
// LDMA model
// =============================================================================

mod ldma_regs {
    pub const STATUS: usize = 0x004;
    pub const CHEN: usize = 0x020;
    pub const CHDONE: usize = 0x028;
    pub const SWREQ: usize = 0x030;
    pub const LINKLOAD: usize = 0x03C;
    pub const IF: usize = 0x060;
    pub const IFC: usize = 0x068;
    pub const CH: usize = 0x080;
    pub const CH_STRIDE: usize = 0x30;
    pub const REQSEL: usize = 0x00;
    pub const CTRL: usize = 0x0C;
    pub const SRC: usize = 0x10;
    pub const DST: usize = 0x14;
    pub const LINK: usize = 0x18;
    pub const SIZE: usize = 0x200;
}

/// A model of the LDMA controller.
///
/// Like the hardware, the model copies a descriptor into the channel
/// registers when it's loaded, and follows its link when it's done. A
/// descriptor with `STRUCTREQ` requests itself when it's loaded.
///
/// Like the uDMA model, command registers (`IFC`, `SWREQ`, `LINKLOAD`) hold
/// only the last value written between two syncs.
pub struct Ldma {
    registers: Block,
    upper: u64,
    current: [u32; 8],
    requests: u32,
    flags: u32,
    sink: Sink,
}

impl Ldma {
    pub fn new(arena: &Arena) -> Self {
        Ldma {
            registers: Block::new(ldma_regs::SIZE),
            upper: arena.upper(),
            current: [0; 8],
            requests: 0,
            flags: 0,
            sink: Sink::default(),
        }
    }

    pub fn registers(&self) -> &Block {
        &self.registers
    }

    fn ch(&self, channel: usize, register: usize) -> usize {
        ldma_regs::CH + ldma_regs::CH_STRIDE * channel + register
    }

    pub fn sync(&mut self) {
        use ldma_regs::*;
        self.flags &= !self.registers.read(IFC);
        self.registers.write(IFC, 0);
        self.registers.write(IF, self.flags);

        let loads = self.registers.read(LINKLOAD);
        self.registers.write(LINKLOAD, 0);
        for channel in (0..8).filter(|&channel| loads & (1u32 << channel) != 0) {
            let address = self.registers.read(self.ch(channel, LINK)) & !0x3;
            self.load(channel, address);
        }

        self.requests |= self.registers.read(SWREQ);
        self.registers.write(SWREQ, 0);
    }

    fn load(&mut self, channel: usize, address: u32) {
        use ldma_regs::*;
        self.current[channel] = address;
        for (idx, register) in [CTRL, SRC, DST, LINK].into_iter().enumerate() {
            let word = read_word(self.upper, address + 4 * idx as u32);
            self.registers.write(self.ch(channel, register), word);
        }
        if self.registers.read(self.ch(channel, CTRL)) & (1 << 3) != 0 {
            self.requests |= 1 << channel;
        }
    }

    /// A peripheral requests channel `channel`.
    pub fn trigger(&mut self, channel: usize) {
        self.sync();
        self.arbitrate(channel);
    }

    /// Serve pending software requests.
    pub fn step(&mut self) {
        self.sync();
        for channel in 0..8 {
            let mask = 1 << channel;
            if self.requests & mask != 0 {
                self.requests &= !mask;
                self.arbitrate(channel);
            }
        }
    }

    pub fn raise_error(&mut self, channel: usize) {
        self.registers
            .write(ldma_regs::STATUS, (channel as u32) << 8 | 0x1);
        self.flags |= 1 << 31;
        self.registers.write(ldma_regs::IF, self.flags);
    }

    pub fn request_select(&self, channel: usize) -> u32 {
        self.registers.read(self.ch(channel, ldma_regs::REQSEL))
    }

    pub fn watch(&mut self, address: u32) {
        self.sink.address = Some(address);
    }

    pub fn samples(&self) -> &[u32] {
        &self.sink.samples
    }

    fn arbitrate(&mut self, channel: usize) {
        use ldma_regs::*;
        let mask = 1 << channel;
        if self.registers.read(CHEN) & mask == 0 {
            return;
        }
        let ctrl = self.registers.read(self.ch(channel, CTRL));
        let remaining = ((ctrl >> 4) & 0x7FF) + 1;
        let all = ctrl & (1 << 21) != 0;
        let block = match (ctrl >> 16) & 0xF {
            _ if all => remaining,
            0 => 1,
            1 => 2,
            2 => 3,
            3 => 4,
            4 => 6,
            5 => 8,
            7 => 16,
            9 => 32,
            10 => 64,
            11 => 128,
            12 => 256,
            13 => 512,
            14 => 1024,
            _ => remaining,
        }
        .min(remaining);
        let size = (ctrl >> 26) & 0x3;
        let step = |inc: u32| if inc == 3 { 0 } else { (1 << inc) << size };
        let src_step = step((ctrl >> 24) & 0x3);
        let dst_step = step((ctrl >> 28) & 0x3);

        let mut source = self.registers.read(self.ch(channel, SRC));
        let mut destination = self.registers.read(self.ch(channel, DST));
        for _ in 0..block {
            let value = copy_element(self.upper, source, destination, size);
            self.sink.observe(destination, value);
            source += src_step;
            destination += dst_step;
        }
        self.registers.write(self.ch(channel, SRC), source);
        self.registers.write(self.ch(channel, DST), destination);

        let remaining = remaining - block;
        if remaining > 0 {
            let ctrl = (ctrl & !(0x7FF << 4)) | ((remaining - 1) << 4);
            self.registers.write(self.ch(channel, CTRL), ctrl);
            return;
        }

        if ctrl & (1 << 20) != 0 {
            self.flags |= mask;
            self.registers.write(IF, self.flags);
        }
        let link = self.registers.read(self.ch(channel, LINK));
        if link & 0x2 != 0 {
            let target = link & !0x3;
            let next = if link & 0x1 != 0 {
                self.current[channel].wrapping_add(target)
            } else {
                target
            };
            self.load(channel, next);
        } else {
            let chen = self.registers.read(CHEN);
            self.registers.write(CHEN, chen & !mask);
            let done = self.registers.read(CHDONE);
            self.registers.write(CHDONE, done | mask);
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "ldma")] {
        /// The model of this build's DMA controller.
        pub type Sim = Ldma;
    } else {
        /// The model of this build's DMA controller.
        pub type Sim = Udma;
    }
}

// =============================================================================
// DMA harness
// =============================================================================

/// Byte offset of caller-owned descriptor lists in the arena, past the
/// control block.
pub const LISTS: usize = 0x800;

/// Byte offset of the buffers in the arena, past the descriptor lists.
pub const BUFFERS: usize = 0x1000;

/// A `Dma` running on a controller model.
pub struct Harness {
    pub arena: &'static Arena,
    pub sim: Sim,
    pub dma: &'static Dma<8>,
}

impl Harness {
    /// An initialized `Dma` whose control block starts the arena.
    pub fn new() -> Self {
        let arena = Arena::new();
        let mut sim = Sim::new(arena);
        let dma: &'static Dma<8> = Box::leak(Box::new(unsafe {
            Dma::new(sim.registers().ptr(), arena.at::<u32>(0).cast_const().cast())
        }));
        unsafe { dma.init() };
        sim.sync();
        Harness { arena, sim, dma }
    }

    /// A descriptor list in DMA-visible memory, starting at [`LISTS`].
    pub fn list<const N: usize>(&self) -> &'static DescriptorList<N> {
        assert!(N * 16 <= BUFFERS - LISTS);
        // Safety: the arena is zeroed, leaked, and the list is aligned.
        unsafe { &*self.arena.at::<DescriptorList<N>>(LISTS) }
    }

    /// Run the DMA interrupt handler, then let the model see the results.
    pub fn service(&mut self) -> crate::Result<()> {
        let result = unsafe { self.dma.on_interrupt() };
        self.sim.sync();
        result
    }

    /// Trigger `channel` `count` times, servicing the interrupt after each
    /// request.
    pub fn run(&mut self, channel: usize, count: usize) {
        for _ in 0..count {
            self.sim.trigger(channel);
            let _ = self.service();
        }
    }
}

// =============================================================================
// Flash
// =============================================================================

/// Page size of the user-data page.
pub const PAGE_SIZE: usize = 2048;

/// A NOR flash model for the [`Flash`] trait.
///
/// Erasing sets every bit of a page. Writing can only clear bits. Addresses
/// start at `base`.
pub struct MockFlash {
    base: u32,
    words: Vec<u32>,
    erases: usize,
    fail: Option<msc::Error>,
}

impl MockFlash {
    pub fn new(base: u32, pages: usize) -> Self {
        MockFlash {
            base,
            words: vec![0; pages * PAGE_SIZE / 4],
            erases: 0,
            fail: None,
        }
    }

    /// Fail every following operation with `error`.
    pub fn fail_with(&mut self, error: msc::Error) {
        self.fail = Some(error);
    }

    pub fn erases(&self) -> usize {
        self.erases
    }

    fn index(&self, address: u32) -> msc::Result<usize> {
        let offset = address.wrapping_sub(self.base) as usize;
        if address < self.base || offset % 4 != 0 || offset / 4 >= self.words.len() {
            return Err(msc::Error::InvalidAddress);
        }
        Ok(offset / 4)
    }
}

impl Flash for MockFlash {
    fn erase_page(&mut self, address: u32) -> msc::Result<()> {
        if let Some(error) = self.fail {
            return Err(error);
        }
        let index = self.index(address)?;
        let first = index - index % (PAGE_SIZE / 4);
        self.words[first..first + PAGE_SIZE / 4].fill(0xFFFF_FFFF);
        self.erases += 1;
        Ok(())
    }

    fn write_word(&mut self, address: u32, value: u32) -> msc::Result<()> {
        if let Some(error) = self.fail {
            return Err(error);
        }
        let index = self.index(address)?;
        self.words[index] &= value;
        Ok(())
    }

    fn read_word(&self, address: u32) -> msc::Result<u32> {
        let index = self.index(address)?;
        Ok(self.words[index])
    }
}
