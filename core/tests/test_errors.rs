// Error codes, user categories, reporting, config validation and telemetry.

#[cfg(test)]
mod tests {
    use std::io;

    use streamglue_core::{
        config::PipelineConfig,
        constants::{flags, MAX_READ_CACHE_SIZE},
        headers::{HeaderError, StageType},
        report::{report_error, VecReporter},
        telemetry::{StageCounters, TelemetrySnapshot, TelemetryTimer},
        types::{ErrorCode, GenericKind, PipelineError, ReportCategory, SpecificKind, Stage},
        PipelineContext,
    };

    #[test]
    fn code_packs_stage_generic_specific() {
        let code = ErrorCode::pack(Stage::Crypto, GenericKind::BadPayloadChecksum, SpecificKind::KeyUnwrap);
        assert_eq!(code.raw(), 0x0004_0503);
        assert_eq!(code.stage(), Some(Stage::Crypto));
        assert_eq!(code.generic(), Some(GenericKind::BadPayloadChecksum));
        assert_eq!(code.specific(), Some(SpecificKind::KeyUnwrap));
    }

    #[test]
    fn errors_carry_their_stage_in_the_code() {
        let err = PipelineError::UnknownStageType { raw: 77 };
        assert_eq!(err.code().stage(), Some(Stage::Dispatcher));
        assert_eq!(err.code().specific(), Some(SpecificKind::UnknownStage));

        let err = PipelineError::ChecksumMismatch { stage: Stage::Signature, stored: 1, computed: 2 };
        assert_eq!(err.code().raw() >> 16, Stage::Signature as u32);
        assert_eq!(err.code().generic(), Some(GenericKind::BadPayloadChecksum));

        let err = PipelineError::from_header(Stage::Compression, HeaderError::BadMagic { found: 1, expected: 2 });
        assert!(matches!(err, PipelineError::BadMagic { stage: Stage::Compression, found: 1, expected: 2 }));
    }

    #[test]
    fn categories_cover_user_visible_classes() {
        let cases = [
            (PipelineError::NotADocument("x".into()), ReportCategory::NotADocument),
            (PipelineError::SignatureInvalid, ReportCategory::Corrupt),
            (PipelineError::DictionaryMismatch { stream: 1, local: 2 }, ReportCategory::Corrupt),
            (PipelineError::Truncated { stage: Stage::Terminal }, ReportCategory::Incomplete),
            (PipelineError::UntrustedKey, ReportCategory::NotPermitted),
            (PipelineError::ActionListFull { max: 10 }, ReportCategory::InternalError),
            (PipelineError::ShortWrite { written: 1, expected: 4 }, ReportCategory::InternalError),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category, "{err}");
        }
    }

    #[test]
    fn io_errors_map_by_kind() {
        let eof = PipelineError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert_eq!(eof.category(), ReportCategory::Incomplete);
        assert_eq!(eof.code().specific(), Some(SpecificKind::Truncated));

        let denied = PipelineError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.category(), ReportCategory::NotPermitted);

        let zero = PipelineError::from(io::Error::from(io::ErrorKind::WriteZero));
        assert_eq!(zero.code().specific(), Some(SpecificKind::ShortWrite));
        assert_eq!(zero.code().stage(), Some(Stage::Terminal));
    }

    #[test]
    fn reporter_gets_the_fixed_message_only() {
        let mut reporter = VecReporter::default();
        let err = PipelineError::ChecksumMismatch { stage: Stage::Crypto, stored: 0xAA, computed: 0xBB };
        assert_eq!(report_error(&err, &mut reporter), ReportCategory::Corrupt);
        assert_eq!(reporter.entries, vec![(ReportCategory::Corrupt, "File is corrupt".to_owned())]);
        assert!(!reporter.entries[0].1.contains("0x"));
    }

    #[test]
    fn config_json_fills_defaults_and_rejects_bad_values() {
        let cfg = PipelineConfig::from_json(r#"{ "compression_level": 9, "line_ending": "crlf" }"#).unwrap();
        assert_eq!(cfg.compression_level, 9);
        assert_eq!(cfg.read_cache_size, PipelineConfig::default().read_cache_size);
        assert_eq!(PipelineConfig::from_json(&cfg.to_json().unwrap()).unwrap(), cfg);

        for bad in [
            r#"{ "compression_level": 10 }"#.to_owned(),
            r#"{ "read_cache_size": 0 }"#.to_owned(),
            format!(r#"{{ "read_cache_size": {} }}"#, MAX_READ_CACHE_SIZE + 1),
            format!(r#"{{ "flags": {} }}"#, flags::HAS_CRYPTO),
            r#"{ "cache": 10 }"#.to_owned(),
        ] {
            let err = PipelineConfig::from_json(&bad).unwrap_err();
            assert!(matches!(err, PipelineError::Config(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn invalid_config_is_refused_by_the_context() {
        let cfg = PipelineConfig { compression_level: 12, ..Default::default() };
        let err = PipelineContext::new(cfg).unwrap_err();
        assert_eq!(err.code().specific(), Some(SpecificKind::InvalidConfig));
    }

    #[test]
    fn counters_feed_the_snapshot_ratio() {
        let mut a = StageCounters::default();
        a.add_frame(StageType::Compress, 13);
        a.add_overhead(21);
        a.add_frame(StageType::Document, 13);
        a.add_document(1000);
        a.add_compressed(250);

        assert_eq!(a.frames_glue, 2);
        assert_eq!(a.stage_frames(), 2);
        assert_eq!(a.bytes_overhead, 13 + 13 + 21);

        let mut timer = TelemetryTimer::new();
        timer.finish();
        let snap = TelemetrySnapshot::from(&a, &timer);
        assert!((snap.compression_ratio - 0.25).abs() < f64::EPSILON);
        let json: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(json["counters"]["bytes_document"], 1000);
    }
}
