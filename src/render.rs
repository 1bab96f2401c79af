use image::{GrayImage, Luma};

use crate::builder::QRCode;

// Render
//------------------------------------------------------------------------------

impl QRCode {
    pub fn to_image(&self, module_size: u32) -> GrayImage {
        let qz_size = 4 * module_size;
        let qr_size = self.size() as u32 * module_size;
        let total_size = qz_size + qr_size + qz_size;

        let mut canvas = GrayImage::new(total_size, total_size);
        for y in 0..total_size {
            for x in 0..total_size {
                if x < qz_size || x >= qz_size + qr_size || y < qz_size || y >= qz_size + qr_size {
                    canvas.put_pixel(x, y, Luma([255]));
                    continue;
                }
                let c = ((x - qz_size) / module_size) as i32;
                let r = ((y - qz_size) / module_size) as i32;
                let pixel = if self.get_module(c, r) { Luma([0]) } else { Luma([255]) };
                canvas.put_pixel(x, y, pixel);
            }
        }

        canvas
    }

    pub fn to_str(&self, module_size: usize) -> String {
        let qz_size = 4 * module_size;
        let qr_size = self.size() * module_size;
        let total_size = qz_size + qr_size + qz_size;

        let mut canvas = String::with_capacity(total_size * (total_size + 1));
        for y in 0..total_size {
            for x in 0..total_size {
                if x < qz_size || x >= qz_size + qr_size || y < qz_size || y >= qz_size + qr_size {
                    canvas.push('█');
                    continue;
                }
                let c = ((x - qz_size) / module_size) as i32;
                let r = ((y - qz_size) / module_size) as i32;
                canvas.push(if self.get_module(c, r) { ' ' } else { '█' });
            }
            canvas.push('\n');
        }

        canvas
    }
}

#[cfg(test)]
mod render_tests {
    use crate::builder::QRCode;
    use crate::common::metadata::ECLevel;

    #[test]
    fn test_to_image_dimensions() {
        let qr = QRCode::encode_text("RENDER", ECLevel::L).unwrap();
        let img = qr.to_image(4);
        let expected = (qr.size() as u32 + 8) * 4;
        assert_eq!(img.dimensions(), (expected, expected));
        // Quiet zone stays light, finder corner is dark
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(16, 16).0, [0]);
    }

    #[test]
    fn test_to_str_dimensions() {
        let qr = QRCode::encode_text("RENDER", ECLevel::L).unwrap();
        let total = qr.size() + 8;
        let canvas = qr.to_str(1);
        let lines: Vec<&str> = canvas.lines().collect();
        assert_eq!(lines.len(), total);
        assert!(lines.iter().all(|l| l.chars().count() == total));
        // Dark modules render as spaces on a light block background
        assert_eq!(lines[0].chars().filter(|&c| c == '█').count(), total);
        assert_eq!(lines[4].chars().nth(4), Some(' '));
    }
}
