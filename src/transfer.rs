//! Transfer descriptions
//!
//! A [`Transfer`] holds everything the controller needs to move a block of
//! elements: where to read, where to write, how many elements, how the
//! addresses advance, and how often the channel re-arbitrates. It's plain
//! data. Channels turn it into a hardware descriptor when you call
//! [`Channel::set_descriptor`](crate::channel::Channel::set_descriptor), and
//! completion callbacks use the same value to re-arm a slot.

use crate::element::{Element, ElementSize};

cfg_if::cfg_if! {
    if #[cfg(feature = "ldma")] {
        /// The most elements a single descriptor can move.
        ///
        /// LDMA stores the count minus one in the 11 bit `XFERCNT` field.
        pub const MAX_TRANSFER_COUNT: usize = 2048;
    } else {
        /// The most elements a single descriptor can move.
        ///
        /// The uDMA stores the count minus one in the 10 bit `n_minus_1` field.
        pub const MAX_TRANSFER_COUNT: usize = 1024;
    }
}

/// How an address changes after each element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Increment {
    /// The address stays put. Use this for peripheral data registers.
    Fixed,
    /// The address advances by one element.
    Element,
}

/// How many elements move before the channel re-arbitrates.
///
/// On the uDMA this is `R_power`; on LDMA it's the block size. Either way,
/// one trigger from the peripheral moves up to this many elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arbitration {
    One,
    Two,
    Four,
    Eight,
    Sixteen,
    ThirtyTwo,
    SixtyFour,
    OneHundredTwentyEight,
    TwoHundredFiftySix,
    FiveHundredTwelve,
    OneThousandTwentyFour,
}

impl Arbitration {
    /// Log2 of the number of elements per arbitration.
    pub(crate) const fn log2(self) -> u32 {
        match self {
            Arbitration::One => 0,
            Arbitration::Two => 1,
            Arbitration::Four => 2,
            Arbitration::Eight => 3,
            Arbitration::Sixteen => 4,
            Arbitration::ThirtyTwo => 5,
            Arbitration::SixtyFour => 6,
            Arbitration::OneHundredTwentyEight => 7,
            Arbitration::TwoHundredFiftySix => 8,
            Arbitration::FiveHundredTwelve => 9,
            Arbitration::OneThousandTwentyFour => 10,
        }
    }

    /// The number of elements moved per arbitration.
    pub const fn elements(self) -> usize {
        1 << self.log2()
    }
}

/// A description of one DMA transfer.
///
/// The addresses are stored without a lifetime. You're responsible for
/// keeping the memory valid for as long as a channel may use the transfer,
/// which, for a self-refreshing transfer, is forever. That's why activating
/// a channel is `unsafe`.
///
/// # Panics
///
/// All constructors panic if `count` is zero or greater than
/// [`MAX_TRANSFER_COUNT`]. In a `const` or `static` initializer, that's a
/// compile-time error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    source: *const (),
    destination: *mut (),
    size: ElementSize,
    count: u16,
    source_increment: Increment,
    destination_increment: Increment,
    arbitration: Arbitration,
    auto_start: bool,
}

// Safety: a Transfer is a bag of addresses. It never dereferences them.
unsafe impl Send for Transfer {}
// Safety: see above.
unsafe impl Sync for Transfer {}

impl Transfer {
    /// Copy `count` elements from `source` to `destination`, advancing both
    /// addresses.
    pub const fn new<E: Element>(source: *const E, destination: *mut E, count: usize) -> Self {
        assert!(
            count > 0 && count <= MAX_TRANSFER_COUNT,
            "DMA transfer count out of range"
        );
        Transfer {
            source: source.cast(),
            destination: destination.cast(),
            size: E::SIZE,
            count: count as u16,
            source_increment: Increment::Element,
            destination_increment: Increment::Element,
            arbitration: Arbitration::One,
            auto_start: false,
        }
    }

    /// Feed `count` elements from memory into a peripheral data register.
    pub const fn memory_to_peripheral<E: Element>(
        source: *const E,
        register: *mut E,
        count: usize,
    ) -> Self {
        Self::new(source, register, count).with_destination_increment(Increment::Fixed)
    }

    /// Drain `count` elements from a peripheral data register into memory.
    pub const fn peripheral_to_memory<E: Element>(
        register: *const E,
        destination: *mut E,
        count: usize,
    ) -> Self {
        Self::new(register, destination, count).with_source_increment(Increment::Fixed)
    }

    /// Forward `count` elements from one peripheral data register to another.
    pub const fn peripheral_to_peripheral<E: Element>(
        source: *const E,
        destination: *mut E,
        count: usize,
    ) -> Self {
        Self::new(source, destination, count)
            .with_source_increment(Increment::Fixed)
            .with_destination_increment(Increment::Fixed)
    }

    /// Set the source increment.
    pub const fn with_source_increment(mut self, increment: Increment) -> Self {
        self.source_increment = increment;
        self
    }

    /// Set the destination increment.
    pub const fn with_destination_increment(mut self, increment: Increment) -> Self {
        self.destination_increment = increment;
        self
    }

    /// Set the arbitration rate. The default is [`Arbitration::One`].
    pub const fn with_arbitration(mut self, arbitration: Arbitration) -> Self {
        self.arbitration = arbitration;
        self
    }

    /// Run the whole transfer from one request that the channel issues
    /// itself when the descriptor is armed.
    ///
    /// Use this for memory-to-memory copies. On LDMA this sets the
    /// descriptor's `STRUCTREQ` and moves every element per request. On the
    /// uDMA, basic activation uses the auto-request cycle, and a descriptor
    /// list runs as memory scatter-gather. Ping-pong transfers on the uDMA
    /// still need a request per cycle.
    pub const fn with_auto_start(mut self) -> Self {
        self.auto_start = true;
        self
    }

    pub const fn source(&self) -> *const () {
        self.source
    }

    pub const fn destination(&self) -> *mut () {
        self.destination
    }

    pub const fn element_size(&self) -> ElementSize {
        self.size
    }

    /// The number of elements this transfer moves.
    pub const fn count(&self) -> usize {
        self.count as usize
    }

    pub const fn source_increment(&self) -> Increment {
        self.source_increment
    }

    pub const fn destination_increment(&self) -> Increment {
        self.destination_increment
    }

    pub const fn arbitration(&self) -> Arbitration {
        self.arbitration
    }

    /// Returns `true` if the transfer starts without a trigger.
    pub const fn is_auto_start(&self) -> bool {
        self.auto_start
    }

    /// The hardware "count minus one" value.
    pub(crate) const fn count_minus_one(&self) -> u32 {
        self.count as u32 - 1
    }

    /// Address of the last element read, given the increment.
    pub(crate) fn source_end(&self) -> u32 {
        end_address(
            self.source as usize as u32,
            self.source_increment,
            self.size,
            self.count_minus_one(),
        )
    }

    /// Address of the last element written, given the increment.
    pub(crate) fn destination_end(&self) -> u32 {
        end_address(
            self.destination as usize as u32,
            self.destination_increment,
            self.size,
            self.count_minus_one(),
        )
    }
}

fn end_address(start: u32, increment: Increment, size: ElementSize, count_minus_one: u32) -> u32 {
    match increment {
        Increment::Fixed => start,
        Increment::Element => start + (count_minus_one << size.log2()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_addresses_point_at_last_element() {
        let transfer = Transfer::new(0x2000_0000 as *const u16, 0x2000_0100 as *mut u16, 8);
        assert_eq!(transfer.source_end(), 0x2000_000E);
        assert_eq!(transfer.destination_end(), 0x2000_010E);
        assert_eq!(transfer.count_minus_one(), 7);
    }

    #[test]
    fn fixed_addresses_do_not_move() {
        let transfer =
            Transfer::memory_to_peripheral(0x2000_0000 as *const u32, 0x4000_4020 as *mut u32, 32);
        assert_eq!(transfer.source_end(), 0x2000_007C);
        assert_eq!(transfer.destination_end(), 0x4000_4020);
        assert_eq!(transfer.destination_increment(), Increment::Fixed);
        assert_eq!(transfer.source_increment(), Increment::Element);
    }

    #[test]
    fn single_element_transfer() {
        let transfer =
            Transfer::peripheral_to_memory(0x4000_C01C as *const u8, 0x2000_0000 as *mut u8, 1);
        assert_eq!(transfer.count(), 1);
        assert_eq!(transfer.count_minus_one(), 0);
        assert_eq!(transfer.destination_end(), 0x2000_0000);
    }

    #[test]
    fn largest_transfer_is_accepted() {
        let transfer = Transfer::new(
            0x2000_0000 as *const u8,
            0x2000_1000 as *mut u8,
            MAX_TRANSFER_COUNT,
        );
        assert_eq!(transfer.count(), MAX_TRANSFER_COUNT);
    }

    #[test]
    #[should_panic]
    fn empty_transfer_panics() {
        let _ = Transfer::new(0x2000_0000 as *const u8, 0x2000_1000 as *mut u8, 0);
    }

    #[test]
    #[should_panic]
    fn oversized_transfer_panics() {
        let _ = Transfer::new(
            0x2000_0000 as *const u8,
            0x2000_1000 as *mut u8,
            MAX_TRANSFER_COUNT + 1,
        );
    }

    #[test]
    fn auto_start_is_opt_in() {
        let transfer = Transfer::new(0x2000_0000 as *const u32, 0x2000_1000 as *mut u32, 4);
        assert!(!transfer.is_auto_start());
        let transfer = transfer.with_auto_start();
        assert!(transfer.is_auto_start());
        assert_eq!(transfer.count(), 4);
    }

    #[test]
    fn arbitration_sizes() {
        assert_eq!(Arbitration::One.elements(), 1);
        assert_eq!(Arbitration::Eight.elements(), 8);
        assert_eq!(Arbitration::OneThousandTwentyFour.elements(), 1024);
    }
}
