// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

use proptest::prelude::*;
use upkg_store_core::test::arb_package_record;
use upkg_store_db::{PackageDb, PackageTable};
use upkg_utils_test::{CanonicalTempDir, pretty_prop_assert_eq};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_save_load_roundtrip(record in arb_package_record()) {
        let tmp = CanonicalTempDir::new().unwrap();
        let db = PackageDb::new(tmp.path());
        db.save(&record).unwrap();
        let loaded = db.load(record.name()).unwrap().unwrap();
        pretty_prop_assert_eq!(loaded, record);
    }

    #[test]
    fn proptest_table_matches_model(
        ops in proptest::collection::vec((0usize..40, any::<bool>()), 0..200)
    ) {
        let mut table = PackageTable::with_capacity(8).unwrap();
        let mut model = std::collections::BTreeSet::new();
        for (i, insert) in ops {
            let name = format!("pkg{i}");
            if insert {
                let record = upkg_store_core::PackageRecord::new(name.parse().unwrap());
                table.insert(&record).unwrap();
                model.insert(name);
            } else {
                let removed = table.remove(&name).unwrap().is_removed();
                prop_assert_eq!(removed, model.remove(&name));
            }
            prop_assert_eq!(table.len(), model.len());
            prop_assert!(table.capacity() >= table.config().min_size);
        }
        let mut names: Vec<_> = table.names().into_iter().map(str::to_owned).collect();
        names.sort();
        prop_assert_eq!(names, model.into_iter().collect::<Vec<_>>());
    }
}
