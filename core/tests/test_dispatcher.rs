// Stream-glue dispatchers: stage selection, nesting, framing errors, write chain.

#[cfg(test)]
mod tests {
    use streamglue_core::{
        compression::Dictionary,
        constants::{magic, MAX_NESTING_DEPTH},
        crypto::KeyStore,
        headers::{FrameHeader, SignerInfo, StageType, StreamGlueFrame},
        pipeline::{
            ActionList, PipelineAction, ReadContext, ReadDispatcher, ReadState, WriteDispatcher, WriteEnv,
            WriteState,
        },
        types::{PipelineError, ReportCategory, Stage},
    };

    fn framed(stage: StageType, body: &[u8]) -> Vec<u8> {
        let mut out = StreamGlueFrame::new(stage, body.len() as u32).encode();
        out.extend_from_slice(body);
        out
    }

    fn loopbacks(levels: usize, document: &[u8]) -> Vec<u8> {
        let mut stream = framed(StageType::Document, document);
        for _ in 0..levels {
            stream = framed(StageType::LoopBack, &stream);
        }
        stream
    }

    fn write_chain(actions: &[PipelineAction], keys: Option<&KeyStore>, payload: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let dict = Dictionary::builtin();
        let mut env = WriteEnv::new(keys, &dict, 6);
        let mut chain = WriteDispatcher::from_actions(ActionList::from_slice(actions)?);
        chain.push(payload)?;
        let mut out = Vec::new();
        chain.finish(&mut env, &mut |b: &[u8]| {
            out.extend_from_slice(b);
            Ok(())
        })?;
        Ok(out)
    }

    #[test]
    fn document_frame_lands_in_context() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        let stream = framed(StageType::Document, b"hello");
        assert_eq!(d.push(&stream, &mut cx).unwrap(), stream.len());
        assert!(d.is_done());
        d.finish().unwrap();
        assert_eq!(cx.document, b"hello");
        assert_eq!(d.glue().unwrap().stage(), Some(StageType::Document));
    }

    #[test]
    fn unknown_stage_fails_after_the_glue_header() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        let mut stream =
            StreamGlueFrame { magic: magic::STREAM_GLUE, total_length: 4, stage_type: 9999, header_crc32: 0 }.encode();
        stream.extend_from_slice(b"junk");

        let err = d.push(&stream, &mut cx).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStageType { raw: 9999 }));
        assert_eq!(err.category(), ReportCategory::Corrupt);
        assert_eq!(d.consumed(), StreamGlueFrame::LEN as u64);
        assert_eq!(d.state(), ReadState::Failed);
        assert!(d.push(b"more", &mut cx).is_err());
    }

    #[test]
    fn corrupt_glue_header_is_reported_by_the_dispatcher() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut stream = framed(StageType::Document, b"abc");
        stream[3] ^= 0x10;
        let err = ReadDispatcher::new().push(&stream, &mut cx).unwrap_err();
        assert!(matches!(err, PipelineError::BadHeaderChecksum { stage: Stage::Dispatcher, .. }));
    }

    #[test]
    fn header_split_across_pushes() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        let stream = loopbacks(3, b"split me");
        for byte in &stream {
            assert_eq!(d.push(std::slice::from_ref(byte), &mut cx).unwrap(), 1);
        }
        d.finish().unwrap();
        assert_eq!(cx.document, b"split me");
    }

    #[test]
    fn outer_frame_end_leaves_trailing_bytes_with_the_caller() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        let mut stream = framed(StageType::Document, b"abc");
        let frame_len = stream.len();
        stream.extend_from_slice(b"tail");
        assert_eq!(d.push(&stream, &mut cx).unwrap(), frame_len);
        assert!(d.is_done());
    }

    #[test]
    fn nested_frame_with_trailing_garbage_is_a_length_mismatch() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut inner = framed(StageType::Document, b"abc");
        inner.push(0xEE);
        let stream = framed(StageType::LoopBack, &inner);
        let err = ReadDispatcher::new().push(&stream, &mut cx).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { stage: Stage::Dispatcher, .. }), "{err:?}");
    }

    #[test]
    fn nested_frame_cut_short_is_truncated() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let inner = framed(StageType::Document, b"abcdef");
        let stream = framed(StageType::LoopBack, &inner[..inner.len() - 2]);
        let err = ReadDispatcher::new().push(&stream, &mut cx).unwrap_err();
        assert!(matches!(err, PipelineError::Truncated { .. }), "{err:?}");
        assert_eq!(err.category(), ReportCategory::Incomplete);
    }

    #[test]
    fn finish_before_the_frame_ends_is_truncated() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        let stream = framed(StageType::Document, b"abcdef");
        d.push(&stream[..stream.len() - 1], &mut cx).unwrap();
        assert_eq!(d.state(), ReadState::StageActive);
        assert!(matches!(d.finish().unwrap_err(), PipelineError::Truncated { stage: Stage::Dispatcher }));
    }

    #[test]
    fn empty_document_frame_completes_on_its_header() {
        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        d.push(&framed(StageType::Document, b""), &mut cx).unwrap();
        assert!(d.is_done());
        assert!(cx.document.is_empty());
    }

    #[test]
    fn nesting_is_capped() {
        let dict = Dictionary::builtin();

        let mut cx = ReadContext::new(None, &dict);
        let mut d = ReadDispatcher::new();
        d.push(&loopbacks(MAX_NESTING_DEPTH, b"deep"), &mut cx).unwrap();
        d.finish().unwrap();
        assert_eq!(cx.document, b"deep");

        let mut cx = ReadContext::new(None, &dict);
        let err = ReadDispatcher::new()
            .push(&loopbacks(MAX_NESTING_DEPTH + 1, b"deeper"), &mut cx)
            .unwrap_err();
        assert!(matches!(err, PipelineError::NestingTooDeep { max: MAX_NESTING_DEPTH }));
    }

    #[test]
    fn write_chain_wraps_in_action_order() {
        let keys = KeyStore::from_secrets([7; 32], [8; 32], SignerInfo { name: "Ops".into(), ..Default::default() });
        let actions = [PipelineAction::Compress, PipelineAction::Encrypt, PipelineAction::Sign];
        let chain = WriteDispatcher::from_actions(ActionList::from_slice(&actions).unwrap());
        assert_eq!(chain.stage(), StageType::Document);
        assert_eq!(chain.state(), WriteState::Buffering);
        assert_eq!(chain.depth(), 4);

        let out = write_chain(&actions, Some(&keys), b"layered").unwrap();
        let outer = StreamGlueFrame::decode(&out).unwrap();
        assert_eq!(outer.stage(), Some(StageType::Sign));
        assert_eq!(outer.total_length as usize, out.len() - StreamGlueFrame::LEN);

        let dict = Dictionary::builtin();
        let mut cx = ReadContext::new(Some(&keys), &dict);
        let mut d = ReadDispatcher::new();
        d.push(&out, &mut cx).unwrap();
        d.finish().unwrap();
        assert_eq!(cx.document, b"layered");
        assert_eq!(cx.signer.as_ref().map(|s| s.name.as_str()), Some("Ops"));
        assert_eq!(cx.counters.frames_crypto, 1);
        assert_eq!(cx.counters.stage_frames(), 4);
    }

    #[test]
    fn write_without_keys_fails_for_crypto_and_sign() {
        let err = write_chain(&[PipelineAction::Encrypt], None, b"x").unwrap_err();
        assert!(matches!(err, PipelineError::MissingKeyStore { stage: Stage::Crypto }));
        let err = write_chain(&[PipelineAction::Compress, PipelineAction::Sign], None, b"x").unwrap_err();
        assert!(matches!(err, PipelineError::MissingKeyStore { stage: Stage::Signature }));
    }

    #[test]
    fn finished_write_level_rejects_more_data() {
        let dict = Dictionary::builtin();
        let mut env = WriteEnv::new(None, &dict, 6);
        let mut chain = WriteDispatcher::from_actions(ActionList::new());
        chain.push(b"once").unwrap();
        chain.finish(&mut env, &mut |_: &[u8]| Ok(())).unwrap();
        assert_eq!(chain.state(), WriteState::Done);
        assert!(chain.push(b"twice").is_err());
        assert!(chain.finish(&mut env, &mut |_: &[u8]| Ok(())).is_err());
    }
}
