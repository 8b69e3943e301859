// Compression stage: preset dictionary, incremental inflate, tamper detection.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use streamglue_core::{
        compression::{compress, decompress, Dictionary, Inflater},
        headers::{CompressFrame, FrameHeader},
        types::PipelineError,
    };

    fn sample_text() -> Vec<u8> {
        b"object mesh material texture camera light world scene "
            .iter()
            .cycle()
            .take(20_000)
            .copied()
            .collect()
    }

    fn inflate_in_chunks(frame: &[u8], dict: &Dictionary, chunk: usize) -> Result<Vec<u8>, PipelineError> {
        let mut out = Vec::new();
        let mut inflater = Inflater::new(dict);
        for piece in frame.chunks(chunk.max(1)) {
            inflater.decompress_push(piece, &mut |b: &[u8]| {
                out.extend_from_slice(b);
                Ok(())
            })?;
        }
        inflater.decompress_end()?;
        Ok(out)
    }

    #[test]
    fn frame_records_lengths_and_dictionary() {
        let dict = Dictionary::builtin();
        let payload = sample_text();
        let frame = compress(&payload, &dict, 6).unwrap();
        assert_eq!(frame.header.uncompressed_length as usize, payload.len());
        assert_eq!(frame.header.compressed_length as usize, frame.body.len());
        assert_eq!(frame.header.dictionary_id, Dictionary::BUILTIN_ID);
        assert_eq!(frame.header.dictionary_checksum, dict.checksum());
        assert!(frame.body.len() < payload.len() / 10);

        assert_eq!(decompress(&frame.to_bytes(), &dict).unwrap(), payload);
    }

    #[test]
    fn empty_payload_compresses_to_a_valid_stream() {
        let dict = Dictionary::builtin();
        let frame = compress(&[], &dict, 6).unwrap();
        assert_eq!(frame.header.uncompressed_length, 0);
        assert!(frame.header.compressed_length > 0);
        assert!(decompress(&frame.to_bytes(), &dict).unwrap().is_empty());
    }

    #[test]
    fn output_larger_than_scratch_buffer_is_fully_drained() {
        let dict = Dictionary::builtin();
        let payload = vec![0u8; 1 << 20];
        let bytes = compress(&payload, &dict, 9).unwrap().to_bytes();
        assert_eq!(inflate_in_chunks(&bytes, &dict, bytes.len()).unwrap(), payload);
    }

    #[test]
    fn other_dictionary_is_a_mismatch() {
        let bytes = compress(&sample_text(), &Dictionary::builtin(), 6).unwrap().to_bytes();
        let other = Dictionary::new(Dictionary::BUILTIN_ID, b"a different preset".to_vec());
        let err = decompress(&bytes, &other).unwrap_err();
        assert!(matches!(err, PipelineError::DictionaryMismatch { .. }), "{err:?}");
    }

    #[test]
    fn dictionary_mismatch_is_raised_once_the_header_is_complete() {
        let bytes = compress(&sample_text(), &Dictionary::builtin(), 6).unwrap().to_bytes();
        let other = Dictionary::new(7, Dictionary::builtin().bytes().to_vec());
        let mut inflater = Inflater::new(&other);
        let mut sunk = 0usize;
        let mut sink = |b: &[u8]| -> Result<(), PipelineError> {
            sunk += b.len();
            Ok(())
        };

        assert!(inflater.decompress_push(&bytes[..CompressFrame::LEN - 1], &mut sink).is_ok());
        let err = inflater.decompress_push(&bytes[CompressFrame::LEN - 1..], &mut sink).unwrap_err();
        assert!(matches!(err, PipelineError::DictionaryMismatch { .. }), "{err:?}");
        assert_eq!(sunk, 0);
    }

    #[test]
    fn flipped_body_byte_fails() {
        let dict = Dictionary::builtin();
        let payload = sample_text();
        let mut bytes = compress(&payload, &dict, 6).unwrap().to_bytes();
        let mid = CompressFrame::LEN + (bytes.len() - CompressFrame::LEN) / 2;
        bytes[mid] ^= 0x40;
        match decompress(&bytes, &dict) {
            Err(PipelineError::Codec(_)) | Err(PipelineError::LengthMismatch { .. }) => {}
            other => panic!("tampered stream accepted: {other:?}"),
        }
    }

    #[test]
    fn missing_tail_is_rejected_at_end() {
        let dict = Dictionary::builtin();
        let bytes = compress(&sample_text(), &dict, 6).unwrap().to_bytes();
        let err = decompress(&bytes[..bytes.len() - 3], &dict).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { .. }), "{err:?}");
    }

    #[test]
    fn extra_body_bytes_are_rejected() {
        let dict = Dictionary::builtin();
        let mut bytes = compress(b"abc", &dict, 6).unwrap().to_bytes();
        bytes.push(0);
        let err = decompress(&bytes, &dict).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { .. }), "{err:?}");
    }

    #[test]
    fn header_only_is_truncated_stream() {
        let dict = Dictionary::builtin();
        let bytes = compress(b"abc", &dict, 6).unwrap().to_bytes();
        let mut inflater = Inflater::new(&dict);
        inflater.decompress_push(&bytes[..10], &mut |_: &[u8]| Ok(())).unwrap();
        let err = inflater.decompress_end().unwrap_err();
        assert!(matches!(err, PipelineError::Truncated { .. }));
    }

    proptest! {
        #[test]
        fn byte_at_a_time_matches_one_shot(
            payload in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..64,
        ) {
            let dict = Dictionary::builtin();
            let bytes = compress(&payload, &dict, 6).unwrap().to_bytes();
            let whole = inflate_in_chunks(&bytes, &dict, bytes.len()).unwrap();
            let single = inflate_in_chunks(&bytes, &dict, 1).unwrap();
            let odd = inflate_in_chunks(&bytes, &dict, chunk).unwrap();
            prop_assert_eq!(&whole, &payload);
            prop_assert_eq!(&single, &payload);
            prop_assert_eq!(&odd, &payload);
        }
    }
}
