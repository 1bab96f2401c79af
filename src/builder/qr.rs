use crate::common::{
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::{
        format_info, Color, ECLevel, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_MAIN,
        FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL,
        VERSION_INFO_COORDS_TR,
    },
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl std::ops::Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Func(c) | Module::Version(c) | Module::Format(c) | Module::Data(c) => c,
            Module::Empty => &Color::Dark,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QR {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask_pattern: Option<MaskPattern>,
    grid: Vec<Module>,
}

// Construction grid
//------------------------------------------------------------------------------

impl QR {
    pub fn new(version: Version, ec_level: ECLevel) -> Self {
        let width = version.width();
        Self {
            version,
            width,
            ec_level,
            mask_pattern: None,
            grid: vec![Module::Empty; width * width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&&m| *m == Color::Dark).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.width as i16;
        (0..w)
            .map(|r| {
                (0..w)
                    .map(|c| match self.get(r, c) {
                        Module::Empty => '-',
                        Module::Func(color) => color.select('.', '#'),
                        Module::Version(color) => color.select('v', 'V'),
                        Module::Format(color) => color.select('f', 'F'),
                        Module::Data(color) => color.select('o', '*'),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.width as i16;
        debug_assert!((-w..w).contains(&r), "Row {r} out of bounds");
        debug_assert!((-w..w).contains(&c), "Column {c} out of bounds");

        r.rem_euclid(w) as usize * self.width + c.rem_euclid(w) as usize
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self[(r, c)]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        self[(r, c)] = module;
    }
}

impl std::ops::Index<(i16, i16)> for QR {
    type Output = Module;
    fn index(&self, (r, c): (i16, i16)) -> &Self::Output {
        &self.grid[self.coord_to_index(r, c)]
    }
}

impl std::ops::IndexMut<(i16, i16)> for QR {
    fn index_mut(&mut self, (r, c): (i16, i16)) -> &mut Self::Output {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }
}


// Function patterns
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }

    fn draw_finder_patterns(&mut self) {
        let far = self.width as i16 - 4;
        for (r, c) in [(3, 3), (3, far), (far, 3)] {
            self.draw_finder_pattern_at(r, c);
        }
    }

    // 7x7 concentric squares plus the one-module separator, clipped at the edge
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.width as i16;
        for dy in -4..=4i16 {
            for dx in -4..=4i16 {
                let (row, col) = (r + dy, c + dx);
                if !(0..w).contains(&row) || !(0..w).contains(&col) {
                    continue;
                }
                let ring = dy.abs().max(dx.abs());
                let color = if ring == 2 || ring == 4 { Color::Light } else { Color::Dark };
                self.set(row, col, Module::Func(color));
            }
        }
    }

    fn draw_timing_patterns(&mut self) {
        let w = self.width as i16;
        for i in 8..w - 8 {
            let color = if i % 2 == 0 { Color::Dark } else { Color::Light };
            self.set(6, i, Module::Func(color));
            self.set(i, 6, Module::Func(color));
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let centers = self.version.alignment_positions();
        let far = self.width as i16 - 7;
        for &r in centers.iter() {
            for &c in centers.iter() {
                // The three centers under finder patterns are left out
                if (r == 6 && c == 6) || (r == 6 && c == far) || (r == far && c == 6) {
                    continue;
                }
                self.draw_alignment_pattern_at(r, c);
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        for dy in -2..=2i16 {
            for dx in -2..=2i16 {
                let ring = dy.abs().max(dx.abs());
                let color = if ring == 1 { Color::Light } else { Color::Dark };
                self.set(r + dy, c + dx, Module::Func(color));
            }
        }
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, bits: u32) {
        self.draw_number(bits, FORMAT_INFO_BIT_LEN, Module::Format, &FORMAT_INFO_COORDS_MAIN);
        self.draw_number(bits, FORMAT_INFO_BIT_LEN, Module::Format, &FORMAT_INFO_COORDS_SIDE);
        // The one module that is always dark
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    fn draw_version_info(&mut self) {
        if *self.version < 7 {
            return;
        }
        let info = self.version.info();
        self.draw_number(info, VERSION_INFO_BIT_LEN, Module::Version, &VERSION_INFO_COORDS_BL);
        self.draw_number(info, VERSION_INFO_BIT_LEN, Module::Version, &VERSION_INFO_COORDS_TR);
    }

    // Coordinates are ordered most significant bit first
    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        module: fn(Color) -> Module,
        coords: &[(i16, i16)],
    ) {
        for (i, &(r, c)) in coords.iter().enumerate() {
            let dark = (number >> (bit_len - 1 - i)) & 1 == 1;
            self.set(r, c, module(if dark { Color::Dark } else { Color::Light }));
        }
    }
}

#[cfg(test)]
mod qr_information_tests {
    use crate::builder::qr::{Module, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    #[test]
    fn test_version_info_7() {
        let mut qr = QR::new(Version::new(7), ECLevel::L);
        qr.draw_version_info();
        // 0x07C94; bit i sits at (column size-11 + i%3, row i/3) and its mirror
        let bits = [
            false, false, true, false, true, false, false, true, false, false, true, true, true,
            true, true, false, false, false,
        ];
        for (i, &dark) in bits.iter().enumerate() {
            let module = Module::Version(if dark { Color::Dark } else { Color::Light });
            let (r, c) = ((i / 3) as i16, (34 + i % 3) as i16);
            assert_eq!(qr.get(r, c), module, "bit {i}");
            assert_eq!(qr.get(c, r), module, "mirrored bit {i}");
        }
        let drawn = qr.grid.iter().filter(|&&m| m != Module::Empty).count();
        assert_eq!(drawn, 36);
    }

    #[test]
    fn test_no_version_info_below_7() {
        let mut qr = QR::new(Version::new(6), ECLevel::L);
        qr.draw_version_info();
        assert!(qr.grid.iter().all(|&m| m == Module::Empty));
    }

    #[test]
    fn test_reserve_format_area() {
        let mut qr = QR::new(Version::new(1), ECLevel::L);
        qr.reserve_format_area();
        let w = qr.width() as i16;

        // Primary copy around the top-left finder, skipping the timing track
        for i in [0, 1, 2, 3, 4, 5, 7, 8] {
            assert_eq!(qr.get(8, i), Module::Format(Color::Dark), "row copy at {i}");
            assert_eq!(qr.get(i, 8), Module::Format(Color::Dark), "column copy at {i}");
        }
        // Secondary copy split across the other two finders, plus the dark module
        for i in 1..=8 {
            assert_eq!(qr.get(8, w - i), Module::Format(Color::Dark), "right copy at {i}");
            assert_eq!(qr.get(w - i, 8), Module::Format(Color::Dark), "bottom copy at {i}");
        }
        let drawn = qr.grid.iter().filter(|&&m| m != Module::Empty).count();
        assert_eq!(drawn, 31);
    }

    #[test]
    fn test_combined_function_and_info_areas() {
        let mut qr = QR::new(Version::new(7), ECLevel::L);
        qr.draw_all_function_patterns();
        qr.draw_version_info();
        qr.reserve_format_area();
        let expected = [
            "#######.F-------------------------vvV.#######",
            "#.....#.F-------------------------vVv.#.....#",
            "#.###.#.F-------------------------vVv.#.###.#",
            "#.###.#.F-------------------------vVV.#.###.#",
            "#.###.#.F-----------#####---------VVV.#.###.#",
            "#.....#.F-----------#...#---------vvv.#.....#",
            "#######.#.#.#.#.#.#.#.#.#.#.#.#.#.#.#.#######",
            "........F-----------#...#------------........",
            "FFFFFF#FF-----------#####------------FFFFFFFF",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "----#####-----------#####-----------#####----",
            "----#...#-----------#...#-----------#...#----",
            "----#.#.#-----------#.#.#-----------#.#.#----",
            "----#...#-----------#...#-----------#...#----",
            "----#####-----------#####-----------#####----",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "------#--------------------------------------",
            "------.--------------------------------------",
            "vvvvVv#--------------------------------------",
            "vVVVVv.--------------------------------------",
            "VvvVVv#-------------#####-----------#####----",
            "........F-----------#...#-----------#...#----",
            "#######.F-----------#.#.#-----------#.#.#----",
            "#.....#.F-----------#...#-----------#...#----",
            "#.###.#.F-----------#####-----------#####----",
            "#.###.#.F------------------------------------",
            "#.###.#.F------------------------------------",
            "#.....#.F------------------------------------",
            "#######.F------------------------------------",
        ];
        assert_eq!(qr.to_debug_str(), expected.join("\n"));
    }
}

// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_encoding_region(&mut self, payload: &[u8]) {
        debug_assert!(
            payload.len() == self.version.total_codewords(),
            "Expected {} payload codewords, got {}",
            self.version.total_codewords(),
            payload.len()
        );

        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Module::Empty), "Undrawn module left behind");
    }

    fn draw_payload(&mut self, payload: &[u8]) {
        let mut bits =
            payload.iter().flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1));
        let mut placed = 0;
        for (r, c) in EncRegionIter::new(self.version) {
            if self.get(r, c) != Module::Empty {
                continue;
            }
            // Cells left over once the codewords run out hold the remainder
            // bits, which stay light
            let color = match bits.next() {
                Some(true) => Color::Dark,
                _ => Color::Light,
            };
            self.set(r, c, Module::Data(color));
            placed += 1;
        }
        debug_assert!(
            placed == self.version.raw_data_modules(),
            "Filled {placed} data modules, expected {}",
            self.version.raw_data_modules()
        );
    }

    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        let flip = pattern.mask_function();
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                if !flip(r, c) {
                    continue;
                }
                if let Module::Data(color) = self[(r, c)] {
                    self[(r, c)] = Module::Data(!color);
                }
            }
        }
        self.mask_pattern = Some(pattern);
        self.draw_format_info(format_info(self.ec_level, pattern));
    }
}

#[cfg(test)]
mod encoding_region_tests {
    use crate::builder::qr::{Module, QR};
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_data_module_count() {
        for v in 1..=40 {
            let version = Version::new(v);
            let payload = vec![0; version.total_codewords()];
            let mut qr = QR::new(version, ECLevel::L);
            qr.draw_all_function_patterns();
            qr.draw_encoding_region(&payload);
            let data_modules = qr.grid.iter().filter(|&m| matches!(m, Module::Data(_))).count();
            assert_eq!(data_modules, version.raw_data_modules(), "version {v}");
        }
    }
}

// Finished symbol
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QRCode {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask_pattern: MaskPattern,
    modules: Vec<bool>,
}

impl QR {
    pub fn freeze(self) -> QRCode {
        debug_assert!(!self.grid.contains(&Module::Empty), "Undrawn module left behind");

        let mask_pattern = self.mask_pattern.expect("Mask should be applied before freezing");
        let modules = self.grid.iter().map(|&m| *m == Color::Dark).collect();
        QRCode {
            version: self.version,
            width: self.width,
            ec_level: self.ec_level,
            mask_pattern,
            modules,
        }
    }
}

impl QRCode {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn size(&self) -> usize {
        self.width
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask(&self) -> MaskPattern {
        self.mask_pattern
    }

    // x is the column, y the row; anything out of range reads light
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let w = self.width as i32;
        if x < 0 || x >= w || y < 0 || y >= w {
            return false;
        }
        self.modules[(y * w + x) as usize]
    }

    pub fn metadata(&self) -> String {
        format!(
            "{{ Version: {}, Ec level: {:?}, Mask: {} }}",
            *self.version, self.ec_level, *self.mask_pattern
        )
    }
}
