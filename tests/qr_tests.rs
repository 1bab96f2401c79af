use proptest::prelude::*;

use qrsmith::{ECLevel, QRCode};

fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
    prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_round_trip(data in "[ -~]{1,120}", ec_level in ec_level_strategy()) {
        let qr = QRCode::encode_text(&data, ec_level).unwrap();
        prop_assert_eq!(qr.size(), *qr.version() * 4 + 17);
        prop_assert!(*qr.mask() < 8);

        let img = qr.to_image(6);
        let mut img = rqrr::PreparedImage::prepare(img);
        let grids = img.detect_grids();
        prop_assert_eq!(grids.len(), 1);
        let (meta, content) = grids[0].decode().unwrap();
        prop_assert_eq!(meta.version.0, *qr.version());
        prop_assert_eq!(content, data);
    }
}
