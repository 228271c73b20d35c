#[cfg(test)]
mod tests {
    use std::io::Write;

    use plate_scan::normalize::Normalizer;
    use plate_scan::plate_format::{
        PatternEntry, PatternTableConfig, PlateFormatter,
    };

    fn formatter() -> PlateFormatter {
        PlateFormatter::new()
    }

    #[test]
    fn test_standard_plate_is_segmented() {
        let plate = formatter().format("HR26AB1234").unwrap();
        assert_eq!(plate.text, "HR 26 AB 1234");
        assert_eq!(plate.pattern, "standard");
    }

    #[test]
    fn test_standard_plate_single_series_letter() {
        let plate = formatter().format("MH12E1433").unwrap();
        assert_eq!(plate.text, "MH 12 E 1433");
        assert_eq!(plate.pattern, "standard");
    }

    #[test]
    fn test_legacy_plate_keeps_district_digits() {
        // Documented legacy split: state, district, serial
        let plate = formatter().format("HR261234").unwrap();
        assert_eq!(plate.text, "HR 26 1234");
        assert_eq!(plate.pattern, "legacy");

        let plate = formatter().format("HR26123456").unwrap();
        assert_eq!(plate.text, "HR 26 123456");
        assert_eq!(plate.pattern, "legacy");
    }

    #[test]
    fn test_ind_prefixed_plate() {
        let plate = formatter().format("INDHR26AB1234").unwrap();
        assert_eq!(plate.text, "IND HR 26 AB 1234");
        assert_eq!(plate.pattern, "ind-prefixed");
    }

    #[test]
    fn test_special_series_plate() {
        let plate = formatter().format("ABC1234").unwrap();
        assert_eq!(plate.text, "ABC 1234");
        assert_eq!(plate.pattern, "special-series");
    }

    #[test]
    fn test_unrecognized_shape_is_no_match() {
        assert!(formatter().format("ZZZZZZZZ").is_none());
        assert!(formatter().format("").is_none());
        assert!(formatter().format("1234567890").is_none());
    }

    #[test]
    fn test_matching_is_deterministic_and_order_stable() {
        let formatter = formatter();
        let first = formatter.format("HR26AB1234").unwrap();
        for _ in 0..100 {
            let again = formatter.format("HR26AB1234").unwrap();
            assert_eq!(again.pattern, first.pattern);
            assert_eq!(again.text, first.text);
        }
    }

    #[test]
    fn test_first_match_wins_over_later_entries() {
        // Both entries match the input; evaluation stops at the first
        let specific_first = PatternTableConfig {
            patterns: vec![
                PatternEntry {
                    name: "specific".to_string(),
                    pattern: r"^([A-Z]{2})([0-9]{4})$".to_string(),
                    segments: vec!["state".to_string(), "serial".to_string()],
                },
                PatternEntry {
                    name: "catch-all".to_string(),
                    pattern: r"^([A-Z0-9]+)$".to_string(),
                    segments: vec!["raw".to_string()],
                },
            ],
        };
        let formatter = PlateFormatter::from_config(&specific_first).unwrap();
        assert_eq!(formatter.format("HR1234").unwrap().pattern, "specific");

        let catch_all_first = PatternTableConfig {
            patterns: specific_first.patterns.into_iter().rev().collect(),
        };
        let formatter = PlateFormatter::from_config(&catch_all_first).unwrap();
        assert_eq!(formatter.format("HR1234").unwrap().pattern, "catch-all");
    }

    #[test]
    fn test_builtin_table_order() {
        assert_eq!(
            formatter().pattern_names(),
            vec!["ind-prefixed", "standard", "special-series", "legacy"]
        );
    }

    #[test]
    fn test_table_loaded_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
              "patterns": [
                {{
                  "name": "two-by-four",
                  "pattern": "^([A-Z]{{2}})([0-9]{{4}})$",
                  "segments": ["prefix", "serial"]
                }}
              ]
            }}"#
        )
        .unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let config: PatternTableConfig = serde_json::from_str(&content).unwrap();
        config.validate().unwrap();

        let formatter = PlateFormatter::from_config(&config).unwrap();
        let plate = formatter.format("AB1234").unwrap();
        assert_eq!(plate.pattern, "two-by-four");
        assert_eq!(plate.text, "AB 1234");
        // The replacement table fully overrides the built-in one
        assert!(formatter.format("HR26AB1234").is_none());
    }

    #[test]
    fn test_malformed_table_is_rejected_not_panicking() {
        let missing_anchor = PatternTableConfig {
            patterns: vec![PatternEntry {
                name: "loose".to_string(),
                pattern: r"([A-Z]{2})([0-9]{4})".to_string(),
                segments: vec!["state".to_string(), "serial".to_string()],
            }],
        };
        assert!(PlateFormatter::from_config(&missing_anchor).is_err());

        let bad_regex = PatternTableConfig {
            patterns: vec![PatternEntry {
                name: "broken".to_string(),
                pattern: r"^([A-Z]{2}$".to_string(),
                segments: vec!["state".to_string()],
            }],
        };
        assert!(PlateFormatter::from_config(&bad_regex).is_err());
    }

    #[test]
    fn test_confusion_correction_breaks_genuine_series_letters() {
        // End-to-end view of the documented accuracy tradeoff: a genuine
        // series letter O is rewritten to the digit 0 by normalization, so
        // the standard pattern no longer fits and the plate degrades to the
        // unformatted fallback.
        let normalizer = Normalizer::new();
        let normalized = normalizer.normalize("HR26OA1234");
        assert_eq!(normalized, "HR260A1234");
        assert!(formatter().format(&normalized).is_none());

        // Whereas the digit-misread case it exists for is repaired
        let normalized = normalizer.normalize("HR26AB I234");
        assert_eq!(normalized, "HR26AB1234");
        assert_eq!(formatter().format(&normalized).unwrap().text, "HR 26 AB 1234");
    }
}
