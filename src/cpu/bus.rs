// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Bus connects the CPU to Memory
//!
//! The core only ever sees the [Memory] trait: four word-wide accessors,
//! one pair for each address space. [Bus] is a simple implementation for
//! hosts and tests, which keeps both spaces as named [Region]s of one
//! backing store.

use crate::error::{
    Error::{InvalidImage, MissingRegion},
    Result,
};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

/// Memory, as seen from the core.
///
/// Data memory holds 16-bit words. Program memory holds 24-bit words: the
/// upper 16 bits are the payload, and the low 8 bits are the PX lane.
pub trait Memory {
    /// Reads a word of data memory
    fn read_data(&mut self, addr: u16) -> u16;
    /// Writes a word of data memory
    fn write_data(&mut self, addr: u16, value: u16);
    /// Reads a 24-bit word of program memory
    fn read_program(&mut self, addr: u16) -> u32;
    /// Writes a 24-bit word of program memory
    fn write_program(&mut self, addr: u16, value: u32);
}

/// Creates a new bus, growing the backing memory as needed
/// # Examples
/// ```rust
/// # use adsp::prelude::*;
/// let mut bus = bus! {
///     Program [0x0000..0x4000] = &[0x000000, 0x400000],
///     Data    [0x4000..0x8000] = &[0x1234],
/// };
/// assert_eq!(0x1234, bus.read_data(0));
/// ```
#[macro_export]
macro_rules! bus {
    ($($name:path $(:)? [$range:expr] $(= $data:expr)?) ,* $(,)?) => {
        $crate::cpu::bus::Bus::default()
        $(
            .add_region_owned($name, $range)
            $(
                .load_region_owned($name, $data)
            )?
        )*
    };
}

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Program memory (24-bit words)
    Program,
    /// Data memory (16-bit words)
    Data,
    #[doc(hidden)]
    /// Total number of named regions
    Count,
}

impl Region {
    /// Width mask of the words in this region
    pub fn word_mask(self) -> u32 {
        match self {
            Region::Program => 0xff_ffff,
            _ => 0xffff,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Program => "Program",
                Region::Data => "Data",
                _ => "",
            }
        )
    }
}

/// Stores memory in a series of named regions with ranges
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bus {
    memory: Vec<u32>,
    region: [Option<Range<usize>>; Region::Count as usize],
}

impl Bus {
    /// Constructs a new bus
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///     let bus = Bus::new();
    ///     assert!(bus.is_empty());
    /// ```
    pub fn new() -> Self {
        Bus::default()
    }

    /// Constructs a bus with a full 16K-word program space and 16K-word data space
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///     let bus = Bus::full();
    ///     assert_eq!(0x8000, bus.len());
    /// ```
    pub fn full() -> Self {
        Bus::default()
            .add_region_owned(Region::Program, 0x0000..0x4000)
            .add_region_owned(Region::Data, 0x4000..0x8000)
    }

    /// Gets the length of the bus' backing memory, in words
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Grows the Bus backing memory to at least size words, but does not truncate
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///     let mut bus = Bus::new();
    ///     bus.with_size(1234);
    ///     assert_eq!(1234, bus.len());
    ///     bus.with_size(0);
    ///     assert_eq!(1234, bus.len());
    /// ```
    pub fn with_size(&mut self, size: usize) {
        if self.len() < size {
            self.memory.resize(size, 0);
        }
    }

    /// Adds a new named range ([Region]) to an owned [Bus]
    pub fn add_region_owned(mut self, name: Region, range: Range<usize>) -> Self {
        self.add_region(name, range);
        self
    }

    /// Adds a new named range ([Region]) to a [Bus], replacing any old one
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///     let mut bus = Bus::new();
    ///     bus.add_region(Program, 0..1234);
    ///     assert_eq!(1234, bus.len());
    /// ```
    pub fn add_region(&mut self, name: Region, range: Range<usize>) -> &mut Self {
        self.with_size(range.end);
        if let Some(region) = self.region.get_mut(name as usize) {
            *region = Some(range);
        }
        self
    }

    /// Loads data into a [Region] on an *owned* [Bus], for use during initialization
    pub fn load_region_owned(mut self, name: Region, data: &[u32]) -> Self {
        if let Err(e) = self.load_region(name, data) {
            log::warn!("{e}");
        }
        self
    }

    /// Loads words into the start of a named [Region].
    ///
    /// Words are trimmed to the region's width, and anything past the end
    /// of the region is dropped.
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///# fn main() -> Result<()> {
    ///     let mut bus = Bus::new().add_region_owned(Data, 0..4);
    ///     bus.load_region(Data, &[0x1_2345, 0x6789])?;
    ///     assert_eq!(Some([0x2345, 0x6789, 0, 0].as_slice()), bus.get_region(Data));
    ///#    Ok(())
    ///# }
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u32]) -> Result<&mut Self> {
        let mask = name.word_mask();
        let region = self
            .get_region_mut(name)
            .ok_or(MissingRegion { region: name })?;
        if data.len() > region.len() {
            log::warn!(
                "{} words won't fit in {name} ({} words)",
                data.len(),
                region.len()
            );
        }
        for (word, &value) in region.iter_mut().zip(data) {
            *word = value & mask;
        }
        Ok(self)
    }

    /// Loads a program image of big-endian 24-bit words into [Region::Program]
    /// # Examples
    /// ```rust
    ///# use adsp::prelude::*;
    ///# fn main() -> Result<()> {
    ///     let mut bus = Bus::full();
    ///     bus.load_program_bytes(&[0x40, 0x00, 0x10, 0x12, 0x34, 0x56])?;
    ///     assert_eq!(0x400010, bus.read_program(0));
    ///     assert_eq!(0x123456, bus.read_program(1));
    ///#    Ok(())
    ///# }
    /// ```
    /// Images must be made of whole words
    /// ```rust
    ///# use adsp::prelude::*;
    ///     let mut bus = Bus::full();
    ///     assert!(bus.load_program_bytes(&[0x40, 0x00]).is_err());
    /// ```
    pub fn load_program_bytes(&mut self, image: &[u8]) -> Result<&mut Self> {
        if image.len() % 3 != 0 {
            return Err(InvalidImage { len: image.len() });
        }
        let words: Vec<u32> = image
            .chunks_exact(3)
            .map(|word| u32::from_be_bytes([0, word[0], word[1], word[2]]))
            .collect();
        self.clear_region(Region::Program);
        self.load_region(Region::Program, &words)
    }

    /// Loads a program image file into [Region::Program]
    pub fn load_program(&mut self, path: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        self.load_program_bytes(&std::fs::read(path)?)
    }

    /// Fills a [Region] with zeroes. If the region doesn't exist, that's okay.
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        if let Some(region) = self.get_region_mut(name) {
            region.fill(0)
        }
        self
    }

    /// Gets a slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region(&self, name: Region) -> Option<&[u32]> {
        self.memory.get(self.region.get(name as usize)?.clone()?)
    }

    /// Gets a mutable slice of a named region of memory
    #[inline(always)]
    pub fn get_region_mut(&mut self, name: Region) -> Option<&mut [u32]> {
        self.memory.get_mut(self.region.get(name as usize)?.clone()?)
    }

    fn word(&self, name: Region, addr: u16) -> u32 {
        match self.get_region(name).and_then(|r| r.get(addr as usize)) {
            Some(&word) => word,
            None => {
                log::trace!("Read from unmapped {name} address {addr:04x}");
                0
            }
        }
    }

    fn set_word(&mut self, name: Region, addr: u16, value: u32) {
        match self
            .get_region_mut(name)
            .and_then(|r| r.get_mut(addr as usize))
        {
            Some(word) => *word = value & name.word_mask(),
            None => log::trace!("Write to unmapped {name} address {addr:04x}"),
        }
    }
}

impl Memory for Bus {
    fn read_data(&mut self, addr: u16) -> u16 {
        self.word(Region::Data, addr) as u16
    }
    fn write_data(&mut self, addr: u16, value: u16) {
        self.set_word(Region::Data, addr, value as u32)
    }
    fn read_program(&mut self, addr: u16) -> u32 {
        self.word(Region::Program, addr)
    }
    fn write_program(&mut self, addr: u16, value: u32) {
        self.set_word(Region::Program, addr, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_reads_are_zero() {
        let mut bus = Bus::new().add_region_owned(Region::Data, 0..4);
        bus.write_data(8, 0xffff);
        assert_eq!(0, bus.read_data(8));
        assert_eq!(0, bus.read_program(0));
    }

    #[test]
    fn program_words_are_24_bits() {
        let mut bus = Bus::full();
        bus.write_program(0x3fff, 0xffff_ffff);
        assert_eq!(0xff_ffff, bus.read_program(0x3fff));
        bus.write_data(0x3fff, 0xabcd);
        assert_eq!(0xabcd, bus.read_data(0x3fff));
        // the spaces don't alias
        assert_eq!(0xff_ffff, bus.read_program(0x3fff));
    }

    #[test]
    fn missing_region() {
        let mut bus = Bus::new();
        assert!(bus.load_region(Region::Program, &[1]).is_err());
    }

    #[test]
    fn region_display() {
        assert_eq!("Program", Region::Program.to_string());
        assert_eq!("Data", Region::Data.to_string());
    }
}
