#![allow(clippy::items_after_test_module)]

pub mod builder;
mod common;
mod render;

pub use builder::{QRBuilder, QRCode};
pub use common::bitstream::BitStream;
pub use common::codec::{Mode, Segment};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Version};
