//! pipeline/stage.rs
//! One active stage on the read side.
//!
//! Every wrapping stage owns the dispatcher that parses its output, so
//! dropping an `ActiveStage` drops the whole subtree below it.

use tracing::debug;

use crate::compression::Inflater;
use crate::crypto::Decryptor;
use crate::headers::{CompressFrame, CryptoFrame, FrameHeader, SignFrame, SignerInfo, StageType};
use crate::pipeline::read::{forward, ReadContext, ReadDispatcher};
use crate::signature::Verifier;
use crate::types::Result;

#[derive(Debug)]
pub enum ActiveStage {
    Document,
    Compress { inflater: Inflater, inner: Box<ReadDispatcher> },
    Crypto { decryptor: Decryptor, inner: Box<ReadDispatcher> },
    Sign { verifier: Verifier, inner: Box<ReadDispatcher> },
    LoopBack { inner: Box<ReadDispatcher> },
}

impl ActiveStage {
    pub(crate) fn begin(stage: StageType, parent: &ReadDispatcher, cx: &ReadContext<'_>) -> Result<Self> {
        Ok(match stage {
            StageType::Document => ActiveStage::Document,
            StageType::Compress => {
                ActiveStage::Compress { inflater: Inflater::new(cx.dictionary), inner: parent.nested()? }
            }
            StageType::Crypto => ActiveStage::Crypto { decryptor: Decryptor::new(), inner: parent.nested()? },
            StageType::Sign => ActiveStage::Sign { verifier: Verifier::new(), inner: parent.nested()? },
            StageType::LoopBack => ActiveStage::LoopBack { inner: parent.nested()? },
        })
    }

    pub(crate) fn push(&mut self, chunk: &[u8], cx: &mut ReadContext<'_>) -> Result<()> {
        match self {
            ActiveStage::Document => {
                cx.document.extend_from_slice(chunk);
                cx.counters.add_document(chunk.len());
            }
            ActiveStage::Compress { inflater, inner } => {
                inflater.decompress_push(chunk, &mut |out: &[u8]| forward(&mut **inner, out, cx))?;
            }
            ActiveStage::Crypto { decryptor, inner } => {
                let keys = cx.keys;
                decryptor.push(chunk, keys, &mut |out: &[u8]| forward(&mut **inner, out, cx))?;
            }
            ActiveStage::Sign { verifier, inner } => {
                verifier.push(chunk, &mut |out: &[u8]| forward(&mut **inner, out, cx))?;
            }
            ActiveStage::LoopBack { inner } => forward(&mut **inner, chunk, cx)?,
        }
        Ok(())
    }

    pub(crate) fn finish(self, cx: &mut ReadContext<'_>) -> Result<()> {
        match self {
            ActiveStage::Document => {}
            ActiveStage::Compress { inflater, mut inner } => {
                let frame = inflater.decompress_end()?;
                inner.finish()?;
                cx.counters.add_overhead(CompressFrame::LEN);
                cx.counters.add_compressed(u64::from(frame.compressed_length));
            }
            ActiveStage::Crypto { decryptor, mut inner } => {
                let frame = decryptor.finish()?;
                inner.finish()?;
                cx.counters.add_overhead(CryptoFrame::LEN);
                cx.counters.add_ciphertext(u64::from(frame.payload_length));
            }
            ActiveStage::Sign { verifier, mut inner } => {
                let (_, signer) = verifier.finish()?;
                inner.finish()?;
                cx.counters.add_overhead(SignFrame::LEN + SignerInfo::LEN);
                debug!(signer = %signer.name, "signer recorded");
                cx.signer = Some(signer);
            }
            ActiveStage::LoopBack { mut inner } => inner.finish()?,
        }
        Ok(())
    }
}
