// Header codec: layout sizes, CRC and magic validation, bounded slots.

#[cfg(test)]
mod tests {
    use streamglue_core::{
        constants::{magic, MAX_KEY_FIELD_LEN},
        headers::{
            CompressFrame, CryptoFrame, FrameHeader, HeaderError, SignFrame, SignerInfo, StageType,
            StreamGlueFrame,
        },
        utils::compute_checksum,
    };

    fn sample_crypto() -> CryptoFrame {
        CryptoFrame::new(4096, &[0x11; 32], &[0x22; 92], 0xDEAD_BEEF).unwrap()
    }

    #[test]
    fn frame_sizes_are_fixed() {
        assert_eq!(StreamGlueFrame::LEN, 13);
        assert_eq!(CompressFrame::LEN, 21);
        assert_eq!(CryptoFrame::LEN, 281);
        assert_eq!(SignFrame::LEN, 281);
        assert_eq!(SignerInfo::LEN, 1152);

        assert_eq!(StreamGlueFrame::new(StageType::Sign, 7).encode().len(), StreamGlueFrame::LEN);
        assert_eq!(sample_crypto().encode().len(), CryptoFrame::LEN);
    }

    #[test]
    fn glue_frame_is_big_endian_with_crc_trailer() {
        let bytes = StreamGlueFrame::new(StageType::Compress, 0x0102_0304).encode();
        assert_eq!(bytes[0], magic::STREAM_GLUE);
        assert_eq!(&bytes[1..5], &[1, 2, 3, 4]);
        assert_eq!(&bytes[5..9], &[0, 0, 0, 2]);
        assert_eq!(&bytes[9..13], &compute_checksum(&bytes[..9]).to_be_bytes());
    }

    #[test]
    fn decode_returns_the_encoded_fields() {
        let frame = sample_crypto();
        let back = CryptoFrame::decode(&frame.encode()).unwrap();
        assert_eq!(back, frame);
        assert_eq!(back.public_key.len(), 32);
        assert_eq!(back.wrapped_key.len(), 92);

        let c = CompressFrame::new(10, 20, 1, 0xABCD);
        assert_eq!(CompressFrame::decode(&c.encode()).unwrap(), c);
    }

    #[test]
    fn every_single_bit_flip_in_the_body_is_caught() {
        let bytes = SignFrame::new(3, &[5; 32], &[6; 64], 9).unwrap().encode();
        for byte in 1..SignFrame::LEN {
            for bit in 0..8 {
                let mut corrupt = bytes.clone();
                corrupt[byte] ^= 1 << bit;
                let err = SignFrame::decode(&corrupt).unwrap_err();
                assert!(
                    matches!(err, HeaderError::BadHeaderChecksum { .. }),
                    "byte {byte} bit {bit}: {err:?}"
                );
            }
        }
    }

    #[test]
    fn wrong_magic_is_reported_before_crc() {
        let mut bytes = CompressFrame::new(1, 1, 1, 1).encode();
        bytes[0] = magic::CRYPTO;
        assert_eq!(
            CompressFrame::decode(&bytes).unwrap_err(),
            HeaderError::BadMagic { found: magic::CRYPTO, expected: magic::COMPRESS }
        );
    }

    #[test]
    fn short_buffer_is_rejected() {
        let bytes = StreamGlueFrame::new(StageType::Document, 0).encode();
        assert_eq!(
            StreamGlueFrame::decode(&bytes[..12]).unwrap_err(),
            HeaderError::BufferTooShort { have: 12, need: 13 }
        );
    }

    #[test]
    fn oversized_key_slot_fails_to_build() {
        let err = CryptoFrame::new(0, &[0; MAX_KEY_FIELD_LEN + 1], &[], 0).unwrap_err();
        assert!(matches!(err, HeaderError::FieldOverflow { field: "public_key", .. }));
        assert!(SignFrame::new(0, &[], &[0; MAX_KEY_FIELD_LEN], 0).is_ok());
    }

    /// Rewrite a length field and fix the CRC so only the bounds check can object.
    fn with_length_field(mut bytes: Vec<u8>, offset: usize, value: i32) -> Vec<u8> {
        bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        let body_end = bytes.len() - 4;
        let crc = compute_checksum(&bytes[..body_end]);
        bytes[body_end..].copy_from_slice(&crc.to_be_bytes());
        bytes
    }

    #[test]
    fn negative_wrapped_key_length_is_rejected() {
        let wk_len_at = 1 + 4 + MAX_KEY_FIELD_LEN + 4 + MAX_KEY_FIELD_LEN;
        let bytes = with_length_field(sample_crypto().encode(), wk_len_at, -1);
        let err = CryptoFrame::decode(&bytes).unwrap_err();
        assert!(matches!(err, HeaderError::FieldOverflow { field: "wrapped_key", len: -1, .. }));
    }

    #[test]
    fn public_key_length_above_slot_is_rejected() {
        let pk_len_at = 1 + 4 + MAX_KEY_FIELD_LEN;
        let bytes = with_length_field(sample_crypto().encode(), pk_len_at, 131);
        let err = CryptoFrame::decode(&bytes).unwrap_err();
        assert!(matches!(err, HeaderError::FieldOverflow { field: "public_key", len: 131, .. }));
    }

    #[test]
    fn signer_info_is_nul_padded() {
        let info = SignerInfo {
            name: "Ada Lovelace".into(),
            email: "ada@example.org".into(),
            home_url: "https://example.org".into(),
            ..Default::default()
        };
        let bytes = info.encode().unwrap();
        assert_eq!(bytes.len(), SignerInfo::LEN);
        assert_eq!(&bytes[..12], b"Ada Lovelace");
        assert!(bytes[12..64].iter().all(|&b| b == 0));
        assert_eq!(SignerInfo::decode(&bytes).unwrap(), info);
    }

    #[test]
    fn signer_field_longer_than_slot_overflows() {
        let info = SignerInfo { name: "x".repeat(65), ..Default::default() };
        assert!(matches!(
            info.encode().unwrap_err(),
            HeaderError::FieldOverflow { field: "name", len: 65, max: 64 }
        ));
    }

    #[test]
    fn unknown_stage_tag_decodes_but_does_not_map() {
        let frame = StreamGlueFrame { magic: magic::STREAM_GLUE, total_length: 0, stage_type: 9999, header_crc32: 0 };
        let back = StreamGlueFrame::decode(&frame.encode()).unwrap();
        assert_eq!(back.header_crc32, frame.compute_crc());
        assert_eq!(back.stage_type, 9999);
        assert_eq!(back.stage(), None);
    }
}
