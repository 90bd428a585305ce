//! DMA elements

mod private {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// The size of one element moved by a single DMA transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ElementSize {
    /// 8 bits
    Byte,
    /// 16 bits
    HalfWord,
    /// 32 bits
    Word,
}

impl ElementSize {
    /// The size in bytes.
    pub const fn bytes(self) -> u32 {
        1 << self.log2()
    }

    /// Log2 of the size in bytes.
    ///
    /// Both controllers encode sizes (and increments) this way.
    pub(crate) const fn log2(self) -> u32 {
        match self {
            ElementSize::Byte => 0,
            ElementSize::HalfWord => 1,
            ElementSize::Word => 2,
        }
    }
}

/// An ELEMENT that can be moved by the DMA controller
///
/// This trait is sealed; only `u8`, `u16` and `u32` implement it.
pub trait Element: Sized + Copy + private::Sealed {
    /// The element's transfer size
    const SIZE: ElementSize;
}

impl Element for u8 {
    const SIZE: ElementSize = ElementSize::Byte;
}

impl Element for u16 {
    const SIZE: ElementSize = ElementSize::HalfWord;
}

impl Element for u32 {
    const SIZE: ElementSize = ElementSize::Word;
}
