use std::ops::Deref;

use crate::builder::qr::QR;
use crate::common::metadata::Color;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MaskPattern {
    // Each predicate marks the modules to invert, taking (row, column)
    pub fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0 => |r, c| (r + c) % 2 == 0,
            1 => |r, _| r % 2 == 0,
            2 => |_, c| c % 3 == 0,
            3 => |r, c| (r + c) % 3 == 0,
            4 => |r, c| (r / 2 + c / 3) % 2 == 0,
            5 => |r, c| (r * c) % 2 + (r * c) % 3 == 0,
            6 => |r, c| ((r * c) % 2 + (r * c) % 3) % 2 == 0,
            7 => |r, c| ((r + c) % 2 + (r * c) % 3) % 2 == 0,
            _ => unreachable!("Invalid mask pattern"),
        }
    }
}

// Mask selection
//------------------------------------------------------------------------------

// Scores every pattern on a copy, keeping the lowest index on ties
pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let mut best = MaskPattern(0);
    let mut best_penalty = u32::MAX;
    for pattern in (0..8u8).map(MaskPattern) {
        let mut candidate = qr.clone();
        candidate.apply_mask(pattern);
        let penalty = compute_total_penalty(&candidate);
        if penalty < best_penalty {
            best = pattern;
            best_penalty = penalty;
        }
    }
    qr.apply_mask(best);
    best
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    compute_run_penalty(qr, true)
        + compute_run_penalty(qr, false)
        + compute_block_penalty(qr)
        + compute_balance_penalty(qr)
}

// Consecutive same-colored runs and finder-lookalikes, per row or column
fn compute_run_penalty(qr: &QR, is_hor: bool) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let mut history = RunHistory::new(w);
        let mut run_color = Color::Light;
        let mut run_len = 0i32;
        for j in 0..w {
            let clr = if is_hor { *qr.get(i, j) } else { *qr.get(j, i) };
            if clr == run_color {
                run_len += 1;
                if run_len == 5 {
                    pen += 3;
                } else if run_len > 5 {
                    pen += 1;
                }
            } else {
                history.add(run_len);
                if run_color == Color::Light {
                    pen += history.count_patterns() * 40;
                }
                run_color = clr;
                run_len = 1;
            }
        }
        pen += history.terminate(run_color == Color::Dark, run_len) * 40;
    }
    pen
}

// Sliding history of the latest 7 run lengths, most recent first
struct RunHistory {
    width: i32,
    runs: [i32; 7],
}

impl RunHistory {
    fn new(width: i16) -> Self {
        Self { width: width as i32, runs: [0; 7] }
    }

    fn add(&mut self, mut run_len: i32) {
        if self.runs[0] == 0 {
            run_len += self.width; // implicit light border before the first run
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    // Looks for dark-light ratios of 1:1:3:1:1 flanked by 4 modules of light
    fn count_patterns(&self) -> u32 {
        let n = self.runs[1];
        debug_assert!(n <= self.width * 3, "Run length exceeds matrix bounds");
        let core = n > 0
            && self.runs[2] == n
            && self.runs[3] == n * 3
            && self.runs[4] == n
            && self.runs[5] == n;
        (core && self.runs[0] >= n * 4 && self.runs[6] >= n) as u32
            + (core && self.runs[6] >= n * 4 && self.runs[0] >= n) as u32
    }

    fn terminate(&mut self, dark_run: bool, mut run_len: i32) -> u32 {
        if dark_run {
            self.add(run_len);
            run_len = 0;
        }
        self.add(run_len + self.width); // implicit light border after the last run
        self.count_patterns()
    }
}

// 2x2 blocks of a single color
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 1..w {
        for c in 1..w {
            let quad =
                [qr.get(r - 1, c - 1), qr.get(r - 1, c), qr.get(r, c - 1), qr.get(r, c)];
            let darks = quad.iter().filter(|&&m| *m == Color::Dark).count();
            if darks == 0 || darks == 4 {
                pen += 3;
            }
        }
    }
    pen
}

// 10 points for every 5% band the dark ratio sits away from 50%
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark = qr.count_dark_modules();
    let total = qr.width() * qr.width();
    let k = (dark * 20).abs_diff(total * 10).div_ceil(total) - 1;
    (k * 10) as u32
}
