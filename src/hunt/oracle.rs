//! Randomness oracle client: the request seam and pending-request ledger.
//!
//! The oracle itself is external. This module owns the crate-side half of the
//! protocol: issuing requests through an injected [`RandomnessSource`],
//! remembering which participant each request id belongs to, and evicting the
//! record once its settlement commits. [`VrfRandomnessSource`] is a provided
//! sr25519-VRF implementation whose fulfillments carry a verifiable proof,
//! useful for local operation and deterministic tests.

use crate::config::OracleConfig;
use crate::errors::{HuntError, HuntResult};
use crate::hunt::types::RequestId;
use async_trait::async_trait;
use dashmap::DashMap;
use schnorrkel::{Keypair, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const VRF_SIGNING_CONTEXT: &[u8] = b"gridhunt-reveal";

/// Wire parameters of one randomness request, as the oracle consumes them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomnessRequest {
    /// Caller-derived entropy bound into the request
    pub seed: [u8; 32],
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before fulfilling
    pub confirmation_depth: u16,
    /// Gas budget for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Number of random words to deliver (two: one per axis)
    pub word_count: u8,
}

/// External source of verifiable randomness (injected capability)
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    /// Issue a request; the returned id is assigned by the oracle and will be
    /// echoed back with the fulfillment. Errors mean the request was never
    /// accepted and must abort the enclosing submit.
    async fn request_randomness(&self, request: &RandomnessRequest) -> HuntResult<RequestId>;
}

/// A delivered fulfillment with its fairness proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomnessFulfillment {
    pub request_id: RequestId,
    pub words: Vec<u64>,
    /// Hex-encoded sr25519 signature over the input message
    pub proof: String,
    /// Hex-encoded public key of the signing oracle
    pub public_key: String,
    /// Message the proof commits to
    pub input_message: String,
}

/// Crate-side oracle client: issues requests and tracks who asked
pub struct OracleClient {
    source: Arc<dyn RandomnessSource>,
    config: OracleConfig,
    /// request_id -> participant; evicted when the settlement commits
    pending: DashMap<RequestId, String>,
}

impl OracleClient {
    pub fn new(source: Arc<dyn RandomnessSource>, config: OracleConfig) -> Self {
        Self {
            source,
            config,
            pending: DashMap::new(),
        }
    }

    /// Request randomness on behalf of `participant` and record the mapping
    pub async fn request(&self, participant: &str, seed: [u8; 32]) -> HuntResult<RequestId> {
        let request = RandomnessRequest {
            seed,
            subscription_id: self.config.subscription_id,
            confirmation_depth: self.config.confirmation_depth,
            callback_gas_limit: self.config.callback_gas_limit,
            word_count: self.config.word_count,
        };

        let request_id = self.source.request_randomness(&request).await?;
        self.pending.insert(request_id, participant.to_string());
        log::debug!(
            "randomness requested for {} (request {})",
            participant,
            request_id
        );
        Ok(request_id)
    }

    /// Participant a request id belongs to, if we issued it
    pub fn participant_for(&self, request_id: RequestId) -> Option<String> {
        self.pending.get(&request_id).map(|p| p.value().clone())
    }

    /// Drop a settled (or rolled-back) request record
    pub fn evict(&self, request_id: RequestId) -> bool {
        self.pending.remove(&request_id).is_some()
    }

    /// Number of requests still awaiting fulfillment
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// VRF-backed randomness source.
///
/// Request ids come from an atomic counter; the random words are derived by
/// hashing the sr25519 signature over the request's input message, so every
/// fulfillment is reproducible from the proof and publicly verifiable against
/// the source's public key. Fulfillments queue internally until the host
/// drains them and feeds them back through the fulfillment entry point,
/// reproducing the asynchronous request/reveal gap in-process.
pub struct VrfRandomnessSource {
    keypair: Arc<Keypair>,
    next_id: AtomicU64,
    ready: Mutex<VecDeque<RandomnessFulfillment>>,
}

impl VrfRandomnessSource {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
            next_id: AtomicU64::new(0),
            ready: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a source with a fresh random keypair
    pub fn new_random() -> Self {
        use rand_core::OsRng;
        let keypair = Keypair::generate_with(OsRng);
        Self::new(keypair)
    }

    /// Take every fulfillment produced since the last drain
    pub fn drain_ready(&self) -> Vec<RandomnessFulfillment> {
        let mut ready = self.ready.lock().expect("ready queue poisoned");
        ready.drain(..).collect()
    }

    /// Hex-encoded public key fulfillments verify against
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }

    /// Sign `message` and derive the 32-byte VRF output from the signature
    fn vrf_sign(&self, message: &[u8]) -> (Vec<u8>, Vec<u8>) {
        use schnorrkel::context::SigningContext;

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let signature = self.keypair.sign(ctx.bytes(message));

        let mut hasher = Sha256::new();
        hasher.update(signature.to_bytes());
        let output = hasher.finalize().to_vec();

        (output, signature.to_bytes().to_vec())
    }

    /// Verify a fulfillment against its embedded proof and public key
    pub fn verify_fulfillment(fulfillment: &RandomnessFulfillment) -> Result<bool, String> {
        use schnorrkel::context::SigningContext;

        let proof = hex::decode(&fulfillment.proof)
            .map_err(|e| format!("Invalid proof hex: {}", e))?;
        let public_key_bytes = hex::decode(&fulfillment.public_key)
            .map_err(|e| format!("Invalid public key hex: {}", e))?;

        let public_key_array: [u8; 32] = public_key_bytes
            .try_into()
            .map_err(|_| "Public key must be 32 bytes")?;
        let public_key = PublicKey::from_bytes(&public_key_array)
            .map_err(|e| format!("Invalid public key: {:?}", e))?;

        let signature_array: [u8; 64] = proof
            .try_into()
            .map_err(|_| "Signature must be 64 bytes")?;
        let signature = Signature::from_bytes(&signature_array)
            .map_err(|e| format!("Invalid signature: {:?}", e))?;

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let transcript = ctx.bytes(fulfillment.input_message.as_bytes());
        if public_key.verify(transcript, &signature).is_err() {
            return Ok(false);
        }

        // Recompute the words from the proof and compare.
        let mut hasher = Sha256::new();
        hasher.update(signature_array);
        let output = hasher.finalize();
        let expected = words_from_output(&output, fulfillment.words.len());

        Ok(expected.as_deref() == Some(fulfillment.words.as_slice()))
    }
}

/// Split the leading bytes of a VRF output into little-endian u64 words
fn words_from_output(output: &[u8], count: usize) -> Option<Vec<u64>> {
    if count == 0 || count * 8 > output.len() {
        return None;
    }
    Some(
        output
            .chunks_exact(8)
            .take(count)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().expect("8-byte chunk")))
            .collect(),
    )
}

#[async_trait]
impl RandomnessSource for VrfRandomnessSource {
    async fn request_randomness(&self, request: &RandomnessRequest) -> HuntResult<RequestId> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let input_message = format!("{}:{}", request_id, hex::encode(request.seed));
        let (output, proof) = self.vrf_sign(input_message.as_bytes());

        let words = words_from_output(&output, request.word_count as usize).ok_or_else(|| {
            HuntError::OracleUnavailable(format!(
                "unsupported word count {}",
                request.word_count
            ))
        })?;

        let fulfillment = RandomnessFulfillment {
            request_id,
            words,
            proof: hex::encode(proof),
            public_key: hex::encode(self.keypair.public.to_bytes()),
            input_message,
        };

        self.ready
            .lock()
            .expect("ready queue poisoned")
            .push_back(fulfillment);

        Ok(request_id)
    }
}
