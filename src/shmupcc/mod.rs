//! Codec for the shmupcc shot file (`.sht`): player hitboxes, movement,
//! options and per-power-level shooters.
//!
//! Layout of the option block depends on the header's `num_static_options`:
//! with the high bit set, one `all_power` set of `n & 0x7F` options per focus
//! state; otherwise `power_p` sets of `p` options each. Shooter counts are
//! stored in a table ahead of the shooter records.

mod layout;
mod reader;
mod writer;

pub use reader::decode_file;
pub use writer::encode;

pub const VERSION_NAME: &str = "shmupcc";
