pub(crate) mod qr;

use std::ops::Deref;

use crate::common::{
    bitstream::BitStream,
    codec::{writer, Segment},
    ec::{ecc_for_block, generator_poly},
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

pub use qr::QRCode;
use qr::QR;

// Builder
//------------------------------------------------------------------------------

pub struct QRBuilder {
    segments: Vec<Segment>,
    ec_level: ECLevel,
    min_version: Version,
    max_version: Version,
    mask: Option<MaskPattern>,
    boost_ec: bool,
}

impl QRBuilder {
    pub fn new(text: &str) -> Self {
        Self::with_segments(Segment::make_segments(text))
    }

    pub fn binary(data: &[u8]) -> Self {
        Self::with_segments(vec![Segment::make_bytes(data)])
    }

    pub fn with_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            ec_level: ECLevel::M,
            min_version: Version::new(1),
            max_version: Version::new(40),
            mask: None,
            boost_ec: true,
        }
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn version_range(&mut self, min: Version, max: Version) -> &mut Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn boost_ec(&mut self, boost: bool) -> &mut Self {
        self.boost_ec = boost;
        self
    }

    pub fn metadata(&self) -> String {
        format!(
            "{{ Ec level: {:?}, Versions: {}-{}, Boost: {}, Segments: {} }}",
            self.ec_level,
            *self.min_version,
            *self.max_version,
            self.boost_ec,
            self.segments.len()
        )
    }
}


impl QRBuilder {
    pub fn build(&self) -> QRResult<QRCode> {
        if self.min_version > self.max_version {
            return Err(QRError::InvalidVersion);
        }

        // Smallest version in range whose data capacity fits the segments
        let (version, used) = self.fit_version()?;

        // Promote the level as far as the fitted version allows
        let mut ec_level = self.ec_level;
        if self.boost_ec {
            for ecl in [ECLevel::M, ECLevel::Q, ECLevel::H] {
                if used <= version.data_bit_capacity(ecl) {
                    ec_level = ecl;
                }
            }
        }

        let capacity = version.data_bit_capacity(ec_level);
        let mut bs = BitStream::new(capacity);
        for seg in &self.segments {
            writer::push_segment(seg, version, &mut bs);
        }
        writer::push_terminator(&mut bs);
        writer::pad_remaining_capacity(&mut bs);
        debug_assert!(bs.len() == capacity, "Padded stream should fill capacity exactly");

        QRCode::with_codewords(&bs.data()[..capacity >> 3], version, ec_level, self.mask)
    }

    fn fit_version(&self) -> QRResult<(Version, usize)> {
        let mut used = None;
        let mut capacity = 0;
        for v in *self.min_version..=*self.max_version {
            let version = Version::new(v);
            capacity = version.data_bit_capacity(self.ec_level);
            used = Segment::total_bits(&self.segments, version);
            if let Some(bits) = used {
                if bits <= capacity {
                    return Ok((version, bits));
                }
            }
        }
        match used {
            Some(bits) => Err(QRError::DataTooLong(bits, capacity)),
            None => Err(QRError::CapacityOverflow),
        }
    }
}

// Encoding entry points
//------------------------------------------------------------------------------

impl QRCode {
    pub fn encode_text(text: &str, ec_level: ECLevel) -> QRResult<QRCode> {
        QRBuilder::new(text).ec_level(ec_level).build()
    }

    pub fn encode_binary(data: &[u8], ec_level: ECLevel) -> QRResult<QRCode> {
        QRBuilder::binary(data).ec_level(ec_level).build()
    }

    pub fn encode_segments(segments: Vec<Segment>, ec_level: ECLevel) -> QRResult<QRCode> {
        QRBuilder::with_segments(segments).ec_level(ec_level).build()
    }

    // Low level entry: data codewords must already match the version and level
    pub fn with_codewords(
        data: &[u8],
        version: Version,
        ec_level: ECLevel,
        mask: Option<MaskPattern>,
    ) -> QRResult<QRCode> {
        if data.len() != version.data_codewords(ec_level) {
            return Err(QRError::InvalidCodewordLength);
        }

        let payload = Self::add_ecc_and_interleave(data, version, ec_level);

        let mut qr = QR::new(version, ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&payload);

        match mask {
            Some(m) => qr.apply_mask(m),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr.freeze())
    }
}

// ECC & interleaving
//------------------------------------------------------------------------------

impl QRCode {
    fn add_ecc_and_interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
        let (data_blocks, ecc_blocks) = Self::compute_ecc(data, version, ec_level);

        let mut payload = Vec::with_capacity(version.total_codewords());
        payload.extend(Self::interleave(&data_blocks));
        payload.extend(Self::interleave(&ecc_blocks));

        debug_assert!(
            payload.len() == version.total_codewords(),
            "Payload length {} doesn't match total codewords {}",
            payload.len(),
            version.total_codewords()
        );
        payload
    }

    fn compute_ecc(data: &[u8], version: Version, ec_level: ECLevel) -> (Vec<&[u8]>, Vec<Vec<u8>>) {
        let blocks = Self::blockify(data, version, ec_level);
        let generator = generator_poly(version.ecc_per_block(ec_level));
        let ecc = blocks.iter().map(|b| ecc_for_block(b, &generator)).collect();
        (blocks, ecc)
    }

    pub(crate) fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let num_blocks = version.num_blocks(ec_level);
        let ecc_len = version.ecc_per_block(ec_level);
        let total = version.total_codewords();

        // Short blocks come first; the rest carry one extra data byte
        let short_len = total / num_blocks - ecc_len;
        let num_short = num_blocks - total % num_blocks;
        let total_short = short_len * num_short;

        debug_assert!(
            data.len() == total - ecc_len * num_blocks,
            "Expected {} data codewords to split, got {}",
            total - ecc_len * num_blocks,
            data.len()
        );

        let mut data_blocks = Vec::with_capacity(num_blocks);
        data_blocks.extend(data[..total_short].chunks(short_len));
        if num_short < num_blocks {
            data_blocks.extend(data[total_short..].chunks(short_len + 1));
        }
        data_blocks
    }

    // Column-major walk; exhausted blocks simply drop out of later columns
    pub(crate) fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let longest = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let mut out = Vec::with_capacity(blocks.iter().map(|b| b.len()).sum());
        for column in 0..longest {
            out.extend(blocks.iter().filter_map(|b| b.get(column).copied()));
        }
        out
    }
}
