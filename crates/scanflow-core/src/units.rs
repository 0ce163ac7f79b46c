//! Human-readable byte quantities for progress lines.

use std::fmt;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// A byte count rendered with binary prefixes (`"512 B"`, `"1.50 KiB"`, `"3.25 GiB"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ByteSize {
    fn from(n: u64) -> Self {
        ByteSize(n)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        let scaled = |unit: u64| b as f64 / unit as f64;
        match b {
            b if b < KIB => write!(f, "{} B", b),
            b if b < MIB => write!(f, "{:.2} KiB", scaled(KIB)),
            b if b < GIB => write!(f, "{:.2} MiB", scaled(MIB)),
            b if b < TIB => write!(f, "{:.2} GiB", scaled(GIB)),
            _ => write!(f, "{:.2} TiB", scaled(TIB)),
        }
    }
}
